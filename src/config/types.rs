use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Bulk-Extract
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(rename = "field", default = "default_fields")]
    pub fields: Vec<FieldSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            extractor: ExtractorConfig::default(),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            fields: default_fields(),
        }
    }
}

/// Batch processing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BatchConfig {
    /// Number of URLs processed between two flushes of the artifact
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum number of extractions running at once inside a batch
    #[serde(default = "default_max_concurrent_extractions")]
    pub max_concurrent_extractions: usize,

    /// Upper bound for a single extraction, in seconds
    #[serde(default = "default_extraction_timeout_secs")]
    pub extraction_timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent_extractions: default_max_concurrent_extractions(),
            extraction_timeout_secs: default_extraction_timeout_secs(),
        }
    }
}

/// Which page extractor implementation drives the extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorBackend {
    /// Launches a headless Chromium per URL
    #[default]
    Browser,
    /// Fetches the raw HTML over HTTP, no JavaScript execution
    Http,
}

/// Page extractor configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtractorConfig {
    #[serde(default)]
    pub backend: ExtractorBackend,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Explicit Chromium/Chrome executable, auto-detected when absent
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,

    /// Upper bound for page navigation, in seconds
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            backend: ExtractorBackend::default(),
            headless: true,
            chrome_executable: None,
            navigation_timeout_secs: default_navigation_timeout_secs(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the extractor
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the extractor
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the extractor
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for extractor-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "BulkExtract".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory holding the result artifacts
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// Artifact names are `<prefix>_<YYYYMMDDHHMMSS>.csv`
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            file_prefix: default_file_prefix(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// Additional log file next to console output
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// How often the log file is rolled over
    #[serde(default)]
    pub rotation: LogRotation,

    /// Number of rolled log files kept, including the current one
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            rotation: LogRotation::default(),
            max_files: default_max_log_files(),
        }
    }
}

/// Log file rotation period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Never,
    Hourly,
    #[default]
    Daily,
}

/// One field of the extraction schema
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldSpec {
    /// Column name in the artifact
    pub name: String,

    /// CSS selector; the first match is used
    pub selector: String,

    /// Read this attribute instead of the element text
    #[serde(default)]
    pub attribute: Option<String>,

    /// A missing element fails the whole URL instead of yielding "N/A"
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_batch_size() -> usize {
    crate::batch::BATCH_SIZE
}

fn default_max_concurrent_extractions() -> usize {
    1
}

fn default_extraction_timeout_secs() -> u64 {
    60
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_max_log_files() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_prefix() -> String {
    "scraped_results".to_string()
}

fn default_fields() -> Vec<FieldSpec> {
    vec![FieldSpec {
        name: "example".to_string(),
        selector: ".example-class-name".to_string(),
        attribute: None,
        required: true,
    }]
}
