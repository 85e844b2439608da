//! Configuration module for Bulk-Extract
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so an empty file (or no file at all) is a valid
//! configuration.
//!
//! # Example
//!
//! ```no_run
//! use bulk_extract::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("bulk-extract.toml")).unwrap();
//! println!("Batch size: {}", config.batch.batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BatchConfig, Config, ExtractorBackend, ExtractorConfig, FieldSpec, LogRotation,
    LoggingConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
