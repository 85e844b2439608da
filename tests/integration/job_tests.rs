//! End-to-end bulk job tests

use crate::{create_test_config, mount_product, product_urls, read_artifact, ObservedSink};
use bulk_extract::batch::BatchRunner;
use bulk_extract::extract::{build_extractor, PLACEHOLDER};
use bulk_extract::job::{BulkJob, JobStatus};
use bulk_extract::output::{ArtifactStore, CsvResultSink};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a job from config whose sink is observed by the returned handle
fn observed_job(
    config: &bulk_extract::Config,
    wrap: impl FnOnce(ObservedSink, &BatchRunner) -> ObservedSink,
) -> (BulkJob, Arc<ObservedSink>) {
    let extractor = build_extractor(config).expect("Failed to build extractor");
    let store = ArtifactStore::from_config(&config.output);
    let csv = Arc::new(CsvResultSink::new(store.clone(), extractor.field_names()));
    let runner = BatchRunner::from_config(extractor, &config.batch);
    let sink = Arc::new(wrap(ObservedSink::new(csv), &runner));
    (BulkJob::new(runner, sink.clone(), store), sink)
}

#[tokio::test]
async fn test_full_job_writes_artifact_in_order() {
    let server = MockServer::start().await;
    for i in 0..5 {
        mount_product(&server, i).await;
    }
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 2);

    let extractor = build_extractor(&config).unwrap();
    let job = BulkJob::from_config(&config, extractor);
    let urls = product_urls(&server, 5);

    let result = job.submit(&urls).await.expect("Job failed");

    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.batches_flushed, 3);
    assert_eq!(result.succeeded(), 5);

    let records = read_artifact(&result.artifact_path);
    assert_eq!(records[0], vec!["url", "title", "price", "error"]);
    assert_eq!(records.len(), 6);
    for (i, record) in records[1..].iter().enumerate() {
        assert_eq!(record[0], urls[i]);
        assert_eq!(record[1], format!("Product {}", i));
        assert_eq!(record[2], format!("{}.99", i));
        assert_eq!(record[3], "");
    }
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let server = MockServer::start().await;
    mount_product(&server, 0).await;
    mount_product(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/product/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 10);
    let job = BulkJob::from_config(&config, build_extractor(&config).unwrap());

    let mut urls = product_urls(&server, 3);
    urls.push("not a url".to_string());
    urls.push(String::new());

    let result = job.submit(&urls).await.unwrap();

    assert_eq!(result.rows.len(), 5);
    assert_eq!(result.succeeded(), 2);
    assert!(result.rows[0].is_success());
    assert!(result.rows[2].is_success());

    let failed = &result.rows[1];
    assert_eq!(failed.fields.get("title"), Some(PLACEHOLDER));
    assert_eq!(failed.fields.get("price"), Some(PLACEHOLDER));
    assert!(failed.error.as_deref().unwrap().contains("500"));

    let records = read_artifact(&result.artifact_path);
    assert_eq!(records[4][0], "not a url");
    assert_eq!(records[5][0], "");
    assert!(!records[5][3].is_empty());
}

#[tokio::test]
async fn test_missing_optional_field_is_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Plain</h1>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/untitled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p class=\"price\">1</p>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 10);
    let job = BulkJob::from_config(&config, build_extractor(&config).unwrap());
    let urls = vec![
        format!("{}/plain", server.uri()),
        format!("{}/untitled", server.uri()),
    ];

    let result = job.submit(&urls).await.unwrap();

    assert!(result.rows[0].is_success());
    assert_eq!(result.rows[0].fields.get("price"), Some(PLACEHOLDER));
    assert!(!result.rows[1].is_success());
}

#[tokio::test]
async fn test_cancelled_job_keeps_completed_batches() {
    let server = MockServer::start().await;
    for i in 0..10 {
        mount_product(&server, i).await;
    }
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3);

    let (job, sink) = observed_job(&config, |sink, runner| {
        sink.cancel_after(2, runner.cancellation_token())
    });
    let urls = product_urls(&server, 10);

    let result = job.submit(&urls).await.unwrap();

    assert_eq!(result.status, JobStatus::Cancelled { batches_completed: 2 });
    assert_eq!(sink.flush_sizes(), vec![3, 6]);

    // The artifact holds exactly the first two batches, in order
    let records = read_artifact(&result.artifact_path);
    assert_eq!(records.len(), 7);
    for (i, record) in records[1..].iter().enumerate() {
        assert_eq!(record[0], urls[i]);
    }
}

#[tokio::test]
async fn test_batch_boundary_flushes_twice() {
    let server = MockServer::start().await;
    for i in 0..5 {
        mount_product(&server, i).await;
    }
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 4);

    let (job, sink) = observed_job(&config, |sink, _| sink);
    let result = job.submit(&product_urls(&server, 5)).await.unwrap();

    assert_eq!(sink.flush_sizes(), vec![4, 5]);
    assert_eq!(result.batches_flushed, 2);
    assert_eq!(read_artifact(&result.artifact_path).len(), 6);
}

#[tokio::test]
async fn test_empty_input_writes_header_only() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 4);

    let (job, sink) = observed_job(&config, |sink, _| sink);
    let result = job.submit(&[]).await.unwrap();

    assert!(result.rows.is_empty());
    assert_eq!(sink.flush_sizes(), vec![0]);
    assert_eq!(
        std::fs::read_to_string(&result.artifact_path).unwrap(),
        "url,title,price,error\n"
    );
}

#[tokio::test]
async fn test_concurrent_job_preserves_order() {
    let server = MockServer::start().await;
    for i in 0..6 {
        // Earlier pages answer slower so completion order is reversed
        Mock::given(method("GET"))
            .and(path(format!("/product/{}", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("<h1>Product {}</h1>", i))
                    .set_delay(Duration::from_millis(((6 - i) * 30) as u64)),
            )
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), 6);
    config.batch.max_concurrent_extractions = 6;
    let job = BulkJob::from_config(&config, build_extractor(&config).unwrap());
    let urls = product_urls(&server, 6);

    let result = job.submit(&urls).await.unwrap();

    let titles: Vec<&str> = result
        .rows
        .iter()
        .map(|r| r.fields.get("title").unwrap())
        .collect();
    assert_eq!(
        titles,
        (0..6).map(|i| format!("Product {}", i)).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_download_matches_artifact() {
    let server = MockServer::start().await;
    mount_product(&server, 0).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 10);
    let job = BulkJob::from_config(&config, build_extractor(&config).unwrap());

    let result = job.submit(&product_urls(&server, 1)).await.unwrap();

    let by_id = job.read(result.artifact_id.as_str()).unwrap();
    let by_file = job.read(&format!("{}.csv", result.artifact_id)).unwrap();
    assert_eq!(by_id, std::fs::read(&result.artifact_path).unwrap());
    assert_eq!(by_id, by_file);
    assert!(job.read("scraped_results_19700101000000").is_err());
}
