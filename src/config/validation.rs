use crate::config::types::{
    BatchConfig, Config, ExtractorConfig, FieldSpec, LoggingConfig, OutputConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Column names the artifact reserves for itself
const RESERVED_COLUMNS: [&str; 2] = ["url", "error"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_batch_config(&config.batch)?;
    validate_extractor_config(&config.extractor)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_logging_config(&config.logging)?;
    validate_fields(&config.fields)?;
    Ok(())
}

/// Validates batch configuration
fn validate_batch_config(config: &BatchConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.max_concurrent_extractions < 1 || config.max_concurrent_extractions > 32 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_extractions must be between 1 and 32, got {}",
            config.max_concurrent_extractions
        )));
    }

    if config.extraction_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "extraction_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "navigation_timeout_secs must be >= 1".to_string(),
        ));
    }

    if let Some(executable) = &config.chrome_executable {
        if executable.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "chrome_executable cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.file_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "file_prefix cannot be empty".to_string(),
        ));
    }

    if config.file_prefix.contains(['/', '\\']) || config.file_prefix.contains("..") {
        return Err(ConfigError::Validation(format!(
            "file_prefix must be a plain file name, got '{}'",
            config.file_prefix
        )));
    }

    Ok(())
}

/// Validates logging configuration
fn validate_logging_config(config: &LoggingConfig) -> Result<(), ConfigError> {
    if config.max_files < 1 {
        return Err(ConfigError::Validation(format!(
            "max_files must be >= 1, got {}",
            config.max_files
        )));
    }

    if let Some(file) = &config.file {
        if file.file_name().is_none() {
            return Err(ConfigError::Validation(format!(
                "log file must name a file, got '{}'",
                file.display()
            )));
        }
    }

    Ok(())
}

/// Validates the extraction schema
fn validate_fields(fields: &[FieldSpec]) -> Result<(), ConfigError> {
    if fields.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[field]] must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for field in fields {
        let name = field.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "field name cannot be empty".to_string(),
            ));
        }

        if RESERVED_COLUMNS.contains(&name) {
            return Err(ConfigError::Validation(format!(
                "field name '{}' is reserved for the artifact",
                name
            )));
        }

        if !seen.insert(name) {
            return Err(ConfigError::Validation(format!(
                "duplicate field name '{}'",
                name
            )));
        }

        if Selector::parse(&field.selector).is_err() {
            return Err(ConfigError::InvalidSelector {
                field: field.name.clone(),
                selector: field.selector.clone(),
            });
        }

        if let Some(attribute) = &field.attribute {
            if attribute.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "attribute for field '{}' cannot be empty",
                    name
                )));
            }
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
