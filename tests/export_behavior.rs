//! Behaviour tests for snapshot export and the portfolio summary.

mod support;

use std::sync::Arc;

use finscraper_core::export::EXPORT_COLUMNS;
use finscraper_core::{
    read_json_export, ApiErrorKind, ExportFormat, FinancialDataApi, FinancialDataScraper,
    SourceId, SyntheticAdapter,
};
use support::{scraper_with, ScriptedSource};

async fn scraper_tracking(dir: &std::path::Path, tickers: &[&str]) -> FinancialDataScraper {
    let mut scraper = scraper_with(dir, vec![Arc::new(SyntheticAdapter)]);
    scraper
        .batch_add_tickers(tickers)
        .await
        .expect("batch runs");
    scraper
}

#[tokio::test]
async fn json_export_reads_back_as_the_current_snapshot() {
    // Given: three tracked tickers
    let dir = tempfile::tempdir().expect("tempdir");
    let scraper = scraper_tracking(dir.path(), &["AAPL", "MSFT", "GOOGL"]).await;
    let target = dir.path().join("snapshot.json");

    // When: the snapshot is exported as JSON
    let written = scraper
        .export_data(ExportFormat::Json, Some(&target))
        .expect("exports");

    // Then: reading it back yields exactly the cached records
    assert_eq!(written, target);
    let exported = read_json_export(&written).expect("reads back");
    assert_eq!(exported, scraper.get_all_data());
}

#[tokio::test]
async fn csv_export_has_one_row_per_record_under_a_fixed_header() {
    // Given: two tracked tickers
    let dir = tempfile::tempdir().expect("tempdir");
    let scraper = scraper_tracking(dir.path(), &["AAPL", "TSLA"]).await;
    let target = dir.path().join("snapshot.csv");

    // When: the snapshot is exported as CSV
    scraper
        .export_data(ExportFormat::Csv, Some(&target))
        .expect("exports");

    // Then: the header matches and rows follow tracked order
    let mut reader = csv::Reader::from_path(&target).expect("opens csv");
    let header: Vec<String> = reader
        .headers()
        .expect("header")
        .iter()
        .map(str::to_owned)
        .collect();
    assert_eq!(header, EXPORT_COLUMNS);

    let rows: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .expect("rows parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "AAPL");
    assert_eq!(&rows[1][0], "TSLA");
    assert_eq!(&rows[0][7], "synthetic");
    assert_eq!(&rows[0][8], "true");
}

#[tokio::test]
async fn default_export_path_sits_next_to_the_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scraper = scraper_tracking(dir.path(), &["AAPL"]).await;

    let written = scraper
        .export_data(ExportFormat::Csv, None)
        .expect("exports");

    assert_eq!(written.parent(), Some(dir.path()));
    let name = written
        .file_name()
        .and_then(|name| name.to_str())
        .expect("utf-8 name");
    // financial_data_YYYYMMDD_HHMMSS.csv
    assert!(name.starts_with("financial_data_"));
    assert!(name.ends_with(".csv"));
    assert_eq!(name.len(), "financial_data_".len() + 15 + ".csv".len());
    assert!(written.exists());
}

#[tokio::test]
async fn exporting_an_empty_store_writes_an_empty_array() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scraper = scraper_tracking(dir.path(), &[]).await;
    let target = dir.path().join("empty.json");

    scraper
        .export_data(ExportFormat::Json, Some(&target))
        .expect("exports");

    assert!(read_json_export(&target).expect("reads back").is_empty());
}

#[cfg(not(feature = "xlsx"))]
#[tokio::test]
async fn spreadsheet_export_without_the_feature_is_a_capability_gap() {
    // Given: a build without spreadsheet support
    let dir = tempfile::tempdir().expect("tempdir");
    let api = FinancialDataApi::from_scraper(scraper_tracking(dir.path(), &["AAPL"]).await);

    // When: an xlsx export is requested
    let result = api.export_data("xlsx", None);

    // Then: it fails as unavailable and no file is written
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ApiErrorKind::FormatUnavailable));
    let stats = serde_json::to_value(api.get_stats()).expect("serializes");
    assert_eq!(stats["features"]["xlsx_export"], false);
    let xlsx_files = std::fs::read_dir(dir.path())
        .expect("lists dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "xlsx"))
        .count();
    assert_eq!(xlsx_files, 0);
}

#[cfg(feature = "xlsx")]
#[tokio::test]
async fn spreadsheet_export_writes_a_workbook() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scraper = scraper_tracking(dir.path(), &["AAPL"]).await;
    let target = dir.path().join("snapshot.xlsx");

    scraper
        .export_data(ExportFormat::Xlsx, Some(&target))
        .expect("exports");

    let metadata = std::fs::metadata(&target).expect("written");
    assert!(metadata.len() > 0);
}

#[tokio::test]
async fn unknown_export_format_is_a_validation_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let api = FinancialDataApi::from_scraper(scraper_tracking(dir.path(), &[]).await);

    let result = api.export_data("parquet", None);

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ApiErrorKind::Validation));
}

#[tokio::test]
async fn summary_aggregates_sectors_and_averages() {
    // Given: two live records from a scripted source
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scraper = scraper_with(
        dir.path(),
        vec![ScriptedSource::succeeding(SourceId::Yahoo, 10.0)],
    );
    scraper
        .batch_add_tickers(&["AAPL", "MSFT"])
        .await
        .expect("batch runs");
    let api = FinancialDataApi::from_scraper(scraper);

    // When: the summary is requested
    let result = api.get_summary();

    // Then: averages, ranges and sector counts reflect both records
    let value = serde_json::to_value(&result).expect("serializes");
    assert_eq!(value["success"], true);
    assert_eq!(value["summary"]["total_tickers"], 2);
    assert_eq!(value["summary"]["average_price"], 10.0);
    assert_eq!(value["summary"]["average_pe"], 15.0);
    assert_eq!(value["summary"]["price_range"]["min"], 10.0);
    assert_eq!(value["summary"]["sectors"]["Technology"], 2);
    assert_eq!(value["summary"]["synthetic_records"], 0);
}
