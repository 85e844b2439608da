//! Bulk-Extract: batch extraction of structured fields from web pages
//!
//! This crate drives a headless browser (or a plain HTTP client) over a list of
//! URLs, extracts a fixed schema of fields from each page, and persists the
//! results to a CSV artifact that is rewritten after every batch so partial
//! progress survives a crash.

pub mod batch;
pub mod config;
pub mod extract;
pub mod input;
pub mod job;
pub mod logging;
pub mod output;

use thiserror::Error;

/// Main error type for Bulk-Extract operations
#[derive(Debug, Error)]
pub enum BulkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    Validation(#[from] input::ValidationError),

    #[error("Failed to persist results: {0}")]
    Persistence(#[from] output::PersistenceError),

    #[error("{0}")]
    NotFound(#[from] output::NotFoundError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector for field '{field}': {selector}")]
    InvalidSelector { field: String, selector: String },

    #[error("Failed to open log file: {0}")]
    LogFile(#[from] tracing_appender::rolling::InitError),
}

/// Result type alias for Bulk-Extract operations
pub type Result<T> = std::result::Result<T, BulkError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use batch::{BatchRunner, ResultRow, BATCH_SIZE};
pub use config::Config;
pub use extract::{ExtractedFields, ExtractionError, PageExtractor};
pub use job::{BulkJob, JobResult, JobStatus};
