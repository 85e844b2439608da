//! Result sinks
//!
//! A sink persists the accumulated rows of a job. Every flush is a total
//! rewrite of the artifact: the rows are rendered into a temporary file next
//! to the artifact, synced, and renamed over it, so a reader always sees
//! either the previous complete snapshot or the new one.

use crate::batch::ResultRow;
use crate::input::URL_COLUMN;
use crate::output::{ArtifactId, ArtifactStore, PersistenceError};
use std::fs::{self, File};
use std::path::Path;

/// Name of the failure column, always last
pub const ERROR_COLUMN: &str = "error";

/// Persists accumulated rows under an artifact identity
///
/// Flushing the same rows twice must leave the artifact byte-identical.
pub trait ResultSink: Send + Sync {
    /// Replaces the artifact content with `rows`
    fn flush(&self, rows: &[ResultRow], artifact: &ArtifactId) -> Result<(), PersistenceError>;
}

/// Writes artifacts as CSV files in an [`ArtifactStore`]
///
/// Columns are `url`, the schema fields in order, any extra field names seen
/// in the rows (first-seen order), then `error`.
#[derive(Debug, Clone)]
pub struct CsvResultSink {
    store: ArtifactStore,
    field_names: Vec<String>,
}

impl CsvResultSink {
    pub fn new(store: ArtifactStore, field_names: Vec<String>) -> Self {
        Self { store, field_names }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Column layout for a set of rows
    ///
    /// Fields named `url` or `error` would collide with the fixed columns,
    /// so they are left out of the artifact with a warning.
    pub fn columns(&self, rows: &[ResultRow]) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.field_names.len() + 2);
        columns.push(URL_COLUMN.to_string());
        let mut skipped: Vec<&str> = Vec::new();

        let names = self
            .field_names
            .iter()
            .map(String::as_str)
            .chain(rows.iter().flat_map(|row| row.fields.names()));
        for name in names {
            if is_reserved(name) {
                if !skipped.contains(&name) {
                    skipped.push(name);
                }
            } else if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }

        if !skipped.is_empty() {
            tracing::warn!(
                "Dropping extracted fields that collide with fixed columns: {}",
                skipped.join(", ")
            );
        }

        columns.push(ERROR_COLUMN.to_string());
        columns
    }

    fn write_csv(&self, rows: &[ResultRow], path: &Path) -> Result<(), PersistenceError> {
        let io_error = |source: std::io::Error| PersistenceError::Io {
            path: path.display().to_string(),
            source,
        };
        let csv_error = |source: csv::Error| PersistenceError::Csv {
            path: path.display().to_string(),
            source,
        };

        let columns = self.columns(rows);
        let field_columns = &columns[1..columns.len() - 1];

        let file = File::create(path).map_err(io_error)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&columns).map_err(csv_error)?;

        for row in rows {
            let mut record = Vec::with_capacity(columns.len());
            record.push(row.url.as_str());
            for name in field_columns {
                record.push(row.fields.get(name).unwrap_or_default());
            }
            record.push(row.error.as_deref().unwrap_or_default());
            writer.write_record(&record).map_err(csv_error)?;
        }

        let file = writer
            .into_inner()
            .map_err(|e| io_error(e.into_error()))?;
        file.sync_all().map_err(io_error)?;
        Ok(())
    }
}

fn is_reserved(name: &str) -> bool {
    name == URL_COLUMN || name == ERROR_COLUMN
}

impl ResultSink for CsvResultSink {
    fn flush(&self, rows: &[ResultRow], artifact: &ArtifactId) -> Result<(), PersistenceError> {
        let target = self.store.path_of(artifact);
        let staging = self
            .store
            .directory()
            .join(format!(".{}.tmp", artifact.file_name()));

        if let Err(e) = self.write_csv(rows, &staging) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        fs::rename(&staging, &target).map_err(|source| {
            let _ = fs::remove_file(&staging);
            PersistenceError::Io {
                path: target.display().to_string(),
                source,
            }
        })?;

        tracing::debug!("Flushed {} rows to {}", rows.len(), target.display());
        Ok(())
    }
}
