//! Input validation before a job starts

use crate::{create_test_config, product_urls};
use bulk_extract::extract::build_extractor;
use bulk_extract::input::{load_url_csv, ValidationError};
use bulk_extract::job::BulkJob;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_missing_url_column_never_reaches_extractor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, "link").unwrap();
    for url in product_urls(&server, 3) {
        writeln!(input, "{}", url).unwrap();
    }

    let result = load_url_csv(input.path());

    assert!(matches!(
        result,
        Err(ValidationError::MissingUrlColumn { .. })
    ));
    // The mock server verifies on drop that no request arrived
}

#[tokio::test]
async fn test_csv_input_drives_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Item</h1>"))
        .expect(2)
        .mount(&server)
        .await;

    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, "id,url").unwrap();
    for (i, url) in product_urls(&server, 2).iter().enumerate() {
        writeln!(input, "{},{}", i, url).unwrap();
    }

    let records = load_url_csv(input.path()).unwrap();
    let urls: Vec<String> = records.into_iter().map(|r| r.url).collect();

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 10);
    let job = BulkJob::from_config(&config, build_extractor(&config).unwrap());
    let result = job.submit(&urls).await.unwrap();

    assert_eq!(result.succeeded(), 2);
    assert_eq!(result.rows[0].url, urls[0]);
}
