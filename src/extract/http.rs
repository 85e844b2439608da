//! HTTP page extractor
//!
//! Fetches the raw HTML of a page with a plain GET request and applies the
//! extraction strategy to it. No JavaScript runs, so this backend only suits
//! server-rendered pages, but it needs no browser installation.

use crate::config::UserAgentConfig;
use crate::extract::{apply_strategy, ExtractedFields, ExtractionError, ExtractionStrategy};
use crate::extract::PageExtractor;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout_secs` - Overall request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    // Format: Name/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page extractor backed by a shared HTTP client
///
/// The client only pools connections; no cookies or other per-page state are
/// kept between calls.
pub struct HttpPageExtractor {
    client: Client,
    strategy: Arc<dyn ExtractionStrategy>,
}

impl HttpPageExtractor {
    pub fn new(client: Client, strategy: Arc<dyn ExtractionStrategy>) -> Self {
        Self { client, strategy }
    }

    async fn fetch(&self, url: &str) -> Result<String, ExtractionError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_builder() {
                ExtractionError::InvalidUrl {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            } else if e.is_timeout() {
                ExtractionError::Navigation {
                    url: url.to_string(),
                    message: "Request timeout".to_string(),
                }
            } else if e.is_connect() {
                ExtractionError::Navigation {
                    url: url.to_string(),
                    message: "Connection refused".to_string(),
                }
            } else {
                ExtractionError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ExtractionError::Navigation {
                url: url.to_string(),
                message: format!("Failed to read body: {}", e),
            })
    }
}

#[async_trait]
impl PageExtractor for HttpPageExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedFields, ExtractionError> {
        tracing::debug!("Fetching {}", url);
        let body = self.fetch(url).await?;
        apply_strategy(self.strategy.as_ref(), &body)
    }

    fn field_names(&self) -> Vec<String> {
        self.strategy.field_names()
    }
}
