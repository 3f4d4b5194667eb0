//! Tests for bulk checking and CSV export.

use std::fs;

use mail_posture::bulk::{load_domains, run_bulk, write_csv_file, BulkSummary, CSV_COLUMNS};
use tempfile::TempDir;

#[path = "helpers.rs"]
mod helpers;

use helpers::fixture_evaluator;

#[tokio::test]
async fn test_bulk_run_writes_one_row_per_domain_in_order() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("domains.txt");
    fs::write(
        &input,
        "# portfolio\ngood-example.com\n\nbare-example.com\nnot a domain\n",
    )
    .unwrap();

    let domains = load_domains(&input).unwrap();
    assert_eq!(domains.len(), 3);

    let entries = run_bulk(&fixture_evaluator(), domains, 2).await;
    let output = dir.path().join("report.csv");
    write_csv_file(&output, &entries).unwrap();

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers, CSV_COLUMNS);

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);

    assert_eq!(&rows[0][0], "good-example.com");
    assert_eq!(&rows[0][2], "excellent");
    assert_eq!(&rows[0][3], "pass");
    assert_eq!(&rows[0][6], "2");
    assert_eq!(&rows[0][7], "pass");
    assert_eq!(&rows[0][8], "pass");

    assert_eq!(&rows[1][0], "bare-example.com");
    assert_eq!(&rows[1][1], "0");
    assert_eq!(&rows[1][2], "poor");
    assert_eq!(&rows[1][7], "N/A");

    assert_eq!(&rows[2][0], "not a domain");
    assert_eq!(&rows[2][1], "0");
    assert_eq!(&rows[2][2], "ERROR");
    assert!(rows[2][3].starts_with("Invalid domain"));

    let summary = BulkSummary::from_entries(&entries);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.insurance_ready, 1);
}

#[test]
fn test_load_domains_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = load_domains(&dir.path().join("absent.txt")).unwrap_err();
    assert!(err.to_string().contains("Failed to read domain list"));
}

#[test]
fn test_write_csv_to_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let err = write_csv_file(&dir.path().join("no/such/dir/report.csv"), &[]).unwrap_err();
    assert!(err.to_string().contains("Failed to create output file"));
}
