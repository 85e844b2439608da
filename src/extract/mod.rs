//! Page extraction
//!
//! This module turns a single URL into a fixed schema of fields:
//! - `PageExtractor` acquires an isolated session for one URL and releases it
//! - `ExtractionStrategy` maps a parsed document onto the field schema
//! - `BrowserPageExtractor` renders pages in a fresh headless Chromium
//! - `HttpPageExtractor` fetches raw HTML for static sites

mod browser;
mod fields;
mod http;
mod strategy;

pub use browser::BrowserPageExtractor;
pub use fields::{ExtractedFields, PLACEHOLDER};
pub use http::{build_http_client, HttpPageExtractor};
pub use strategy::{apply_strategy, ExtractionStrategy, SelectorStrategy};

use crate::config::{Config, ExtractorBackend};
use crate::ConfigError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that fail the extraction of a single URL
///
/// These never abort a bulk job; the batch runner records them next to the
/// offending URL.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Element not found for field '{field}' (selector '{selector}')")]
    MissingElement { field: String, selector: String },

    #[error("Extraction timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Browser session error: {0}")]
    Session(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Extracts the field schema from one page
///
/// Every call must run in isolation: no browser session or other state is
/// shared between calls, and any acquired session is released before the
/// call returns, on success and on failure.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    /// Extracts the configured fields from the page at `url`
    async fn extract(&self, url: &str) -> Result<ExtractedFields, ExtractionError>;

    /// Names of the fields produced on success, in column order
    fn field_names(&self) -> Vec<String>;
}

/// Extracts a single URL without any batching
///
/// This is the single-item interface; it delegates straight to the extractor.
pub async fn extract_single(
    extractor: &dyn PageExtractor,
    url: &str,
) -> Result<ExtractedFields, ExtractionError> {
    tracing::info!("Extracting details for URL: {}", url);
    let fields = extractor.extract(url).await?;
    tracing::debug!("Extracted information: {:?}", fields);
    Ok(fields)
}

/// Builds the page extractor selected by the configuration
pub fn build_extractor(config: &Config) -> Result<Arc<dyn PageExtractor>, ConfigError> {
    let strategy = Arc::new(SelectorStrategy::from_specs(&config.fields)?);

    let extractor: Arc<dyn PageExtractor> = match config.extractor.backend {
        ExtractorBackend::Browser => {
            Arc::new(BrowserPageExtractor::new(config.extractor.clone(), strategy))
        }
        ExtractorBackend::Http => {
            let client = build_http_client(&config.user_agent, config.batch.extraction_timeout_secs)
                .map_err(|e| ConfigError::Validation(format!("Failed to build HTTP client: {}", e)))?;
            Arc::new(HttpPageExtractor::new(client, strategy))
        }
    };

    Ok(extractor)
}
