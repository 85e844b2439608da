use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so that artifacts can be traced back to the
/// configuration that produced them.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractorBackend, LogRotation};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[batch]
batch-size = 25
max-concurrent-extractions = 4
extraction-timeout-secs = 20

[extractor]
backend = "http"

[user-agent]
crawler-name = "TestExtractor"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
directory = "./out"
file-prefix = "products"

[[field]]
name = "title"
selector = "h1"

[[field]]
name = "price"
selector = "span.price"
required = false
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.batch.batch_size, 25);
        assert_eq!(config.batch.max_concurrent_extractions, 4);
        assert_eq!(config.extractor.backend, ExtractorBackend::Http);
        assert_eq!(config.user_agent.crawler_name, "TestExtractor");
        assert_eq!(config.output.file_prefix, "products");
        assert_eq!(config.fields.len(), 2);
        assert!(config.fields[0].required);
        assert!(!config.fields[1].required);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.batch.batch_size, crate::batch::BATCH_SIZE);
        assert_eq!(config.batch.max_concurrent_extractions, 1);
        assert_eq!(config.extractor.backend, ExtractorBackend::Browser);
        assert_eq!(config.output.file_prefix, "scraped_results");
        assert_eq!(config.fields.len(), 1);
        assert_eq!(config.fields[0].name, "example");
    }

    #[test]
    fn test_logging_section() {
        let config = parse_config(
            "[logging]\nfile = \"logs/app.log\"\nrotation = \"hourly\"\nmax-files = 3\n",
        )
        .unwrap();

        assert_eq!(config.logging.file, Some(PathBuf::from("logs/app.log")));
        assert_eq!(config.logging.rotation, LogRotation::Hourly);
        assert_eq!(config.logging.max_files, 3);

        let defaults = parse_config("").unwrap();
        assert_eq!(defaults.logging.rotation, LogRotation::Daily);
        assert_eq!(defaults.logging.max_files, 5);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[batch]\nbatch-size = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
