//! Batch processing of URL lists
//!
//! This module contains the core of a bulk run:
//! - Partitioning the input into fixed-size batches
//! - Running one isolated extraction per URL
//! - Turning extraction failures into placeholder rows
//! - Reporting the accumulated rows after every batch

mod runner;

pub use runner::{BatchRunner, RunOutcome};

use crate::extract::ExtractedFields;

/// Default number of URLs between two flushes of the artifact
pub const BATCH_SIZE: usize = 100;

/// The result recorded for one input URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    /// The input URL, unchanged
    pub url: String,

    /// Extracted values, or `"N/A"` for every field on failure
    pub fields: ExtractedFields,

    /// Failure message, absent on success
    pub error: Option<String>,
}

impl ResultRow {
    /// Creates the row for a successful extraction
    pub fn success(url: impl Into<String>, fields: ExtractedFields) -> Self {
        Self {
            url: url.into(),
            fields,
            error: None,
        }
    }

    /// Creates a placeholder row for a failed extraction
    pub fn failure<S: AsRef<str>>(
        url: impl Into<String>,
        field_names: &[S],
        message: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            fields: ExtractedFields::placeholder(field_names),
            error: Some(message.into()),
        }
    }

    /// Returns true if the extraction succeeded
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
