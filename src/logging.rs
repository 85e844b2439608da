//! Log file output
//!
//! The console layer is set up by the binary. This module builds the optional
//! rolling file appender described by the `[logging]` section.

use crate::config::{LogRotation, LoggingConfig};
use crate::ConfigError;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Builds the rolling appender for the configured log file, if any
///
/// `logs/app.log` with daily rotation writes `logs/app.<date>.log` and keeps
/// at most `max-files` of them. With `never` the file is used as given.
pub fn file_appender(config: &LoggingConfig) -> Result<Option<RollingFileAppender>, ConfigError> {
    let Some(file) = &config.file else {
        return Ok(None);
    };

    let directory = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ConfigError::Validation(format!("log file must name a file: {}", file.display()))
        })?;

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation(config.rotation))
        .filename_prefix(prefix)
        .max_log_files(config.max_files);
    if let Some(extension) = file.extension() {
        builder = builder.filename_suffix(extension.to_string_lossy().into_owned());
    }

    Ok(Some(builder.build(directory)?))
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Never => Rotation::NEVER,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
    }
}
