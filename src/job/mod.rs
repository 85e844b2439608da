//! Bulk job orchestration
//!
//! A `BulkJob` ties a `BatchRunner` to a `ResultSink`. Each submission gets
//! its own artifact, and the artifact is rewritten from the full row set
//! after every batch so the file on disk always reflects the completed
//! batches in input order.

use crate::batch::{BatchRunner, ResultRow};
use crate::config::Config;
use crate::extract::{build_extractor, PageExtractor};
use crate::input::load_url_csv;
use crate::output::{ArtifactId, ArtifactStore, CsvResultSink, JobStatistics, ResultSink};
use crate::{BulkError, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// How a job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Every URL was processed
    Completed,

    /// The run stopped at a batch boundary; completed batches are on disk
    Cancelled { batches_completed: usize },
}

/// Summary of a finished job
#[derive(Debug, Clone)]
pub struct JobResult {
    pub artifact_id: ArtifactId,
    pub artifact_path: PathBuf,
    pub rows: Vec<ResultRow>,
    pub status: JobStatus,

    /// Number of times the artifact was written
    pub batches_flushed: usize,
}

impl JobResult {
    pub fn succeeded(&self) -> usize {
        self.rows.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.rows.len() - self.succeeded()
    }

    pub fn statistics(&self) -> JobStatistics {
        JobStatistics::from_rows(&self.rows)
    }
}

/// Runs bulk extraction jobs and serves their artifacts
pub struct BulkJob {
    runner: BatchRunner,
    sink: Arc<dyn ResultSink>,
    store: ArtifactStore,
}

impl BulkJob {
    pub fn new(runner: BatchRunner, sink: Arc<dyn ResultSink>, store: ArtifactStore) -> Self {
        Self {
            runner,
            sink,
            store,
        }
    }

    /// Builds a job writing CSV artifacts as configured
    pub fn from_config(config: &Config, extractor: Arc<dyn PageExtractor>) -> Self {
        let store = ArtifactStore::from_config(&config.output);
        let sink = CsvResultSink::new(store.clone(), extractor.field_names());
        let runner = BatchRunner::from_config(extractor, &config.batch);
        Self::new(runner, Arc::new(sink), store)
    }

    /// Builds a job with the extractor selected by the configuration
    pub fn build(config: &Config) -> Result<Self> {
        let extractor = build_extractor(config)?;
        Ok(Self::from_config(config, extractor))
    }

    /// Token that stops running jobs at the next batch boundary
    pub fn cancellation_token(&self) -> CancellationToken {
        self.runner.cancellation_token()
    }

    /// Processes `urls` and persists the rows under a new artifact
    ///
    /// The URLs must already be validated; individual bad URLs only produce
    /// error rows. A persistence failure aborts the job and is returned.
    pub async fn submit(&self, urls: &[String]) -> Result<JobResult> {
        let artifact_id = self.store.allocate(Local::now())?;
        let artifact_path = self.store.path_of(&artifact_id);
        info!(
            "Starting bulk job {} with {} URLs",
            artifact_id,
            urls.len()
        );

        let mut batches_flushed = 0;
        let outcome = self
            .runner
            .run(urls, |rows| {
                self.sink.flush(rows, &artifact_id)?;
                batches_flushed += 1;
                Ok::<(), BulkError>(())
            })
            .await
            .map_err(|e| {
                error!("Bulk job {} failed: {}", artifact_id, e);
                e
            })?;

        // No batch ran, so write the header so the artifact is still valid
        if batches_flushed == 0 {
            self.sink.flush(&outcome.rows, &artifact_id)?;
            batches_flushed += 1;
        }

        let status = if outcome.cancelled {
            JobStatus::Cancelled {
                batches_completed: outcome.batches_completed,
            }
        } else {
            JobStatus::Completed
        };

        info!(
            "Bulk job {} finished ({:?}): {} rows written to {}",
            artifact_id,
            status,
            outcome.rows.len(),
            artifact_path.display()
        );

        Ok(JobResult {
            artifact_id,
            artifact_path,
            rows: outcome.rows,
            status,
            batches_flushed,
        })
    }

    /// Validates a CSV dataset and processes its URLs
    ///
    /// A dataset without a `url` column is rejected before an artifact is
    /// allocated or any page is visited.
    pub async fn submit_csv(&self, input: &Path) -> Result<JobResult> {
        let records = load_url_csv(input)?;
        let urls: Vec<String> = records.into_iter().map(|r| r.url).collect();
        self.submit(&urls).await
    }

    /// Resolves an artifact identity to its path
    pub fn locate(&self, artifact_id: &str) -> Result<PathBuf> {
        Ok(self.store.locate(artifact_id)?)
    }

    /// Reads an artifact for download
    pub fn read(&self, artifact_id: &str) -> Result<Vec<u8>> {
        self.store.read(artifact_id)
    }
}
