//! Output module for persisting job results
//!
//! This module handles:
//! - Allocating and locating artifacts on disk
//! - Rewriting an artifact from the accumulated rows of a job
//! - Summarizing a finished job

mod artifact;
mod sink;
pub mod stats;

pub use artifact::{ArtifactId, ArtifactStore, ARTIFACT_EXTENSION};
pub use sink::{CsvResultSink, ResultSink, ERROR_COLUMN};
pub use stats::{print_statistics, JobStatistics};

use thiserror::Error;

/// Errors raised while writing an artifact
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to write artifact {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to encode artifact {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

/// Raised when an artifact identity does not resolve to a file
#[derive(Debug, Error)]
#[error("Artifact not found: {artifact}")]
pub struct NotFoundError {
    pub artifact: String,
}
