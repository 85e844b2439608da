//! Batch runner
//!
//! Drives a `PageExtractor` over an ordered URL list, one fixed-size window at
//! a time. Every URL runs in its own task, so an error, a timeout, or even a
//! panic only ever costs that URL its row. After each window has fully
//! settled the caller's callback sees all rows produced so far, which is
//! where the job flushes its artifact.

use crate::batch::{ResultRow, BATCH_SIZE};
use crate::config::BatchConfig;
use crate::extract::{ExtractedFields, ExtractionError, PageExtractor};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of a batch run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// One row per processed URL, in input order
    pub rows: Vec<ResultRow>,

    /// Number of batches that completed and were reported
    pub batches_completed: usize,

    /// Number of batches the input was partitioned into
    pub total_batches: usize,

    /// True if the run stopped early on a cancellation request
    pub cancelled: bool,
}

/// Per-batch success and failure counts
#[derive(Debug, Default)]
struct BatchStats {
    success: usize,
    failed: usize,
}

/// Runs extractions in fixed-size batches with per-URL failure isolation
pub struct BatchRunner {
    extractor: Arc<dyn PageExtractor>,
    batch_size: usize,
    max_concurrent: usize,
    extraction_timeout: Duration,
    cancel: CancellationToken,
}

impl BatchRunner {
    /// Creates a sequential runner with the default batch size
    pub fn new(extractor: Arc<dyn PageExtractor>) -> Self {
        Self {
            extractor,
            batch_size: BATCH_SIZE,
            max_concurrent: 1,
            extraction_timeout: Duration::from_secs(60),
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a runner from the batch section of the configuration
    pub fn from_config(extractor: Arc<dyn PageExtractor>, config: &BatchConfig) -> Self {
        Self::new(extractor)
            .with_batch_size(config.batch_size)
            .with_max_concurrent(config.max_concurrent_extractions)
            .with_timeout(Duration::from_secs(config.extraction_timeout_secs))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    /// Uses an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the run at the next batch boundary
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Field names of the underlying extractor
    pub fn field_names(&self) -> Vec<String> {
        self.extractor.field_names()
    }

    /// Processes all URLs batch by batch
    ///
    /// `on_batch_complete` receives every row accumulated so far (not only
    /// the last batch) once a batch has settled. An error returned from it
    /// stops the run and is propagated unchanged.
    ///
    /// # Guarantees
    ///
    /// - Exactly one row per processed URL, in input order
    /// - A failing URL never aborts its batch or the run
    /// - Empty input returns no rows and never calls the callback
    /// - Cancellation is honoured before a batch starts, never mid-batch
    pub async fn run<F, E>(&self, urls: &[String], mut on_batch_complete: F) -> Result<RunOutcome, E>
    where
        F: FnMut(&[ResultRow]) -> Result<(), E>,
    {
        let total_urls = urls.len();
        let total_batches = total_urls.div_ceil(self.batch_size);
        let field_names = self.extractor.field_names();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut rows = Vec::with_capacity(total_urls);

        for (batch_index, window) in urls.chunks(self.batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                warn!(
                    "Run cancelled after {}/{} batches",
                    batch_index, total_batches
                );
                return Ok(RunOutcome {
                    rows,
                    batches_completed: batch_index,
                    total_batches,
                    cancelled: true,
                });
            }

            let batch_start = batch_index * self.batch_size;
            log_batch_start(
                batch_index + 1,
                total_batches,
                batch_start + 1,
                batch_start + window.len(),
                total_urls,
            );

            let batch_rows = self
                .process_batch(window, batch_start, &semaphore, &field_names)
                .await;

            let stats = batch_rows.iter().fold(BatchStats::default(), |mut s, row| {
                if row.is_success() {
                    s.success += 1;
                } else {
                    s.failed += 1;
                }
                s
            });

            rows.extend(batch_rows);
            on_batch_complete(&rows)?;

            log_batch_complete(batch_index + 1, &stats);
        }

        Ok(RunOutcome {
            rows,
            batches_completed: total_batches,
            total_batches,
            cancelled: false,
        })
    }

    /// Runs one window and returns its rows in window order
    async fn process_batch(
        &self,
        window: &[String],
        batch_start: usize,
        semaphore: &Arc<Semaphore>,
        field_names: &[String],
    ) -> Vec<ResultRow> {
        let mut handles = Vec::with_capacity(window.len());

        for url in window {
            let extractor = Arc::clone(&self.extractor);
            let semaphore = Arc::clone(semaphore);
            let task_url = url.clone();
            let timeout = self.extraction_timeout;

            let handle = tokio::spawn(async move {
                // The semaphore is never closed; a failed acquire just runs unbounded
                let _permit = semaphore.acquire_owned().await.ok();
                extract_with_timeout(extractor.as_ref(), &task_url, timeout).await
            });
            handles.push((url, handle));
        }

        // Awaiting in spawn order keeps rows in input order
        let mut rows = Vec::with_capacity(window.len());
        for (offset, (url, handle)) in handles.into_iter().enumerate() {
            let position = batch_start + offset + 1;
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(ExtractionError::Unexpected(format!(
                    "extraction task failed: {}",
                    e
                ))),
            };

            let row = match result {
                Ok(fields) => {
                    debug!("[{}] Extracted {}", position, url);
                    ResultRow::success(url.as_str(), fields)
                }
                Err(e) => {
                    warn!("[{}] Skipping URL due to error: {} - {}", position, url, e);
                    ResultRow::failure(url.as_str(), field_names, e.to_string())
                }
            };
            rows.push(row);
        }

        rows
    }
}

async fn extract_with_timeout(
    extractor: &dyn PageExtractor,
    url: &str,
    timeout: Duration,
) -> Result<ExtractedFields, ExtractionError> {
    match tokio::time::timeout(timeout, extractor.extract(url)).await {
        Ok(result) => result,
        Err(_) => Err(ExtractionError::Timeout { after: timeout }),
    }
}

// ========== Logging helpers ==========

fn log_batch_start(batch_num: usize, total_batches: usize, start: usize, end: usize, total: usize) {
    info!(
        "Starting batch {}/{} (URLs {}-{} of {})",
        batch_num, total_batches, start, end, total
    );
}

fn log_batch_complete(batch_num: usize, stats: &BatchStats) {
    info!(
        "Batch {} complete: {}/{} succeeded",
        batch_num,
        stats.success,
        stats.success + stats.failed
    );
}
