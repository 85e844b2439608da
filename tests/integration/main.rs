//! Integration tests for bulk extraction
//!
//! These tests use wiremock to serve pages and drive whole jobs through the
//! HTTP extractor into CSV artifacts in a temporary directory.

mod input_tests;
mod job_tests;

use bulk_extract::batch::ResultRow;
use bulk_extract::config::{Config, ExtractorBackend, FieldSpec};
use bulk_extract::output::{ArtifactId, PersistenceError, ResultSink};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration extracting `title` and `price`
pub fn create_test_config(output_dir: &Path, batch_size: usize) -> Config {
    let mut config = Config::default();
    config.extractor.backend = ExtractorBackend::Http;
    config.batch.batch_size = batch_size;
    config.batch.extraction_timeout_secs = 5;
    config.output.directory = output_dir.to_path_buf();
    config.user_agent.crawler_name = "TestBot".to_string();
    config.fields = vec![
        FieldSpec {
            name: "title".to_string(),
            selector: "h1".to_string(),
            attribute: None,
            required: true,
        },
        FieldSpec {
            name: "price".to_string(),
            selector: ".price".to_string(),
            attribute: None,
            required: false,
        },
    ];
    config
}

/// Mounts a product page at `/product/<id>`
pub async fn mount_product(server: &MockServer, id: usize) {
    Mock::given(method("GET"))
        .and(path(format!("/product/{}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    r#"<html><body><h1>Product {id}</h1><span class="price">{id}.99</span></body></html>"#
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Product URLs `0..n` on the mock server
pub fn product_urls(server: &MockServer, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("{}/product/{}", server.uri(), i))
        .collect()
}

/// Wraps a sink, recording flush sizes and optionally cancelling a job
pub struct ObservedSink {
    inner: Arc<dyn ResultSink>,
    pub flushes: Mutex<Vec<usize>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ObservedSink {
    pub fn new(inner: Arc<dyn ResultSink>) -> Self {
        Self {
            inner,
            flushes: Mutex::new(Vec::new()),
            cancel_after: None,
        }
    }

    /// Cancels `token` once `flushes` flushes have completed
    pub fn cancel_after(mut self, flushes: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((flushes, token));
        self
    }

    pub fn flush_sizes(&self) -> Vec<usize> {
        self.flushes.lock().unwrap().clone()
    }
}

impl ResultSink for ObservedSink {
    fn flush(&self, rows: &[ResultRow], artifact: &ArtifactId) -> Result<(), PersistenceError> {
        self.inner.flush(rows, artifact)?;

        let mut flushes = self.flushes.lock().unwrap();
        flushes.push(rows.len());
        if let Some((limit, token)) = &self.cancel_after {
            if flushes.len() == *limit {
                token.cancel();
            }
        }
        Ok(())
    }
}

/// Reads an artifact back as CSV records, header included
pub fn read_artifact(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("Failed to open artifact");
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}
