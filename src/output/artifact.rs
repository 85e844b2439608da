//! Artifact identity and lookup
//!
//! An artifact is the CSV file one bulk job writes. Its identity is derived
//! from the job's creation time and reserved on disk at allocation, so two
//! jobs never write the same file.

use crate::config::OutputConfig;
use crate::output::{NotFoundError, PersistenceError};
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File extension of every artifact
pub const ARTIFACT_EXTENSION: &str = "csv";

/// Timestamp format embedded in artifact names
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Identity of one artifact, e.g. `scraped_results_20240501093000`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the artifact inside the output directory
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, ARTIFACT_EXTENSION)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directory of artifacts sharing a name prefix
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    directory: PathBuf,
    prefix: String,
}

impl ArtifactStore {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.directory.clone(), config.file_prefix.clone())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of an artifact, whether or not it exists yet
    pub fn path_of(&self, id: &ArtifactId) -> PathBuf {
        self.directory.join(id.file_name())
    }

    /// Allocates a fresh artifact identity for a job created at `created_at`
    ///
    /// The name is `<prefix>_<YYYYMMDDHHMMSS>`; when that file already exists
    /// a suffix `_1`, `_2`, ... is appended. The chosen file is created empty
    /// to reserve the name.
    pub fn allocate(&self, created_at: DateTime<Local>) -> Result<ArtifactId, PersistenceError> {
        fs::create_dir_all(&self.directory).map_err(|source| PersistenceError::Io {
            path: self.directory.display().to_string(),
            source,
        })?;

        let base = format!("{}_{}", self.prefix, created_at.format(TIMESTAMP_FORMAT));
        let mut attempt = 0u32;

        loop {
            let candidate = if attempt == 0 {
                ArtifactId(base.clone())
            } else {
                ArtifactId(format!("{}_{}", base, attempt))
            };
            let path = self.path_of(&candidate);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    tracing::debug!("Reserved artifact {}", path.display());
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(source) => {
                    return Err(PersistenceError::Io {
                        path: path.display().to_string(),
                        source,
                    })
                }
            }
        }
    }

    /// Resolves an artifact name to its path
    ///
    /// Accepts the identity with or without the `.csv` extension. Names that
    /// would leave the output directory are treated as unknown.
    pub fn locate(&self, artifact: &str) -> Result<PathBuf, NotFoundError> {
        let name = artifact.trim();
        let not_found = || NotFoundError {
            artifact: artifact.to_string(),
        };

        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(not_found());
        }

        let suffix = format!(".{}", ARTIFACT_EXTENSION);
        let file_name = if name.ends_with(&suffix) {
            name.to_string()
        } else {
            format!("{}{}", name, suffix)
        };

        let path = self.directory.join(file_name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(not_found())
        }
    }

    /// Reads the raw bytes of an artifact for download
    pub fn read(&self, artifact: &str) -> crate::Result<Vec<u8>> {
        let path = self.locate(artifact)?;
        Ok(fs::read(path)?)
    }
}
