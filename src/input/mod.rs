//! Input dataset reading
//!
//! Bulk jobs take their URLs from a CSV file with a required `url` column.
//! Validation happens here, before any job is created, so a malformed dataset
//! never produces an artifact or triggers an extraction.

use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Name of the required input column
pub const URL_COLUMN: &str = "url";

/// Errors raised for a malformed input dataset
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("CSV file must contain a 'url' column (found: {})", .found.join(", "))]
    MissingUrlColumn { found: Vec<String> },

    #[error("CSV file has no header row")]
    MissingHeader,

    #[error("Malformed CSV: {0}")]
    Malformed(#[from] csv::Error),

    #[error("Failed to read input {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// One input unit of a bulk job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub url: String,
}

/// Parses a CSV dataset into URL records, in file order
///
/// # Rules
///
/// - The first row is the header; a column named `url` must be present
///   (surrounding whitespace and a UTF-8 BOM are ignored)
/// - All other columns are ignored
/// - Cell values are passed through unchanged, including empty ones
/// - Rows may have differing lengths; a row without a `url` cell yields an
///   empty URL
///
/// # Returns
///
/// * `Ok(Vec<UrlRecord>)` - One record per data row
/// * `Err(ValidationError)` - Missing column or unreadable CSV
pub fn parse_url_csv<R: Read>(reader: R) -> Result<Vec<UrlRecord>, ValidationError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if headers.is_empty() {
        return Err(ValidationError::MissingHeader);
    }

    let found: Vec<String> = headers.iter().map(normalize_header).collect();
    let url_index = found
        .iter()
        .position(|h| h == URL_COLUMN)
        .ok_or_else(|| ValidationError::MissingUrlColumn {
            found: found.clone(),
        })?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        records.push(UrlRecord {
            url: row.get(url_index).unwrap_or_default().to_string(),
        });
    }

    tracing::debug!("Parsed {} URL records", records.len());
    Ok(records)
}

/// Reads and parses a CSV dataset from disk
pub fn load_url_csv(path: &Path) -> Result<Vec<UrlRecord>, ValidationError> {
    let file = std::fs::File::open(path).map_err(|source| ValidationError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_url_csv(file)
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_string()
}
