//! Behaviour tests for the scraper facade and its result-object API.

mod support;

use std::sync::Arc;
use std::time::Duration;

use finscraper_core::{
    AddOutcome, ApiErrorKind, FinancialDataApi, FinancialDataScraper, FinancialRecord,
    RecordStore, ScraperError, SourceError, SourceId, SyntheticAdapter, Ticker, UtcDateTime,
    ValidationError,
};
use support::{config_in, registry_of, scraper_with, Script, ScriptedSource};

fn offline_scraper(dir: &std::path::Path) -> FinancialDataScraper {
    scraper_with(dir, vec![Arc::new(SyntheticAdapter)])
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn validate_ticker_follows_the_syntax_rule() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scraper = offline_scraper(dir.path());

    assert!(scraper.validate_ticker("AAPL"));
    assert!(scraper.validate_ticker("GOOGL"));
    assert!(scraper.validate_ticker("BRK.B"));
    assert!(!scraper.validate_ticker(""));
    assert!(!scraper.validate_ticker("   "));
    assert!(!scraper.validate_ticker("INVALID123456789"));
    assert!(!scraper.validate_ticker("BAD-TICKER"));
}

#[tokio::test]
async fn malformed_ticker_is_rejected_before_any_source_is_asked() {
    // Given: a scraper with a counting source
    let dir = tempfile::tempdir().expect("tempdir");
    let source = ScriptedSource::succeeding(SourceId::Yahoo, 1.0);
    let mut scraper = scraper_with(dir.path(), vec![source.clone()]);

    // When: a malformed ticker is added
    let error = scraper.add_ticker("BAD-TICKER").await.expect_err("invalid");

    // Then: a typed validation error is returned and no source was called
    assert!(matches!(
        error,
        ScraperError::Validation(ValidationError::TickerInvalidChar { ch: '-', .. })
    ));
    assert_eq!(source.calls(), 0);
    assert!(scraper.get_ticker_list().is_empty());
}

// =============================================================================
// Add / remove / clear
// =============================================================================

#[tokio::test]
async fn adding_a_new_ticker_grows_the_list_by_one_and_duplicates_do_not() {
    // Given: an empty scraper
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scraper = offline_scraper(dir.path());

    // When: a ticker is added twice, the second time in lower case
    let first = scraper.add_ticker("AAPL").await.expect("adds");
    let second = scraper.add_ticker("aapl").await.expect("no error");

    // Then: the first add succeeds and the second reports already tracked
    assert!(first.is_added());
    assert!(matches!(second, AddOutcome::AlreadyTracked));
    assert_eq!(scraper.get_ticker_list().len(), 1);
    let record = scraper.get_ticker_data("AAPL").expect("cached");
    assert_eq!(record.ticker.as_str(), "AAPL");
}

#[tokio::test]
async fn removing_a_ticker_drops_it_and_is_idempotent() {
    // Given: two tracked tickers
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scraper = offline_scraper(dir.path());
    scraper.add_ticker("AAPL").await.expect("adds");
    scraper.add_ticker("MSFT").await.expect("adds");

    // When: one is removed twice
    let removed = scraper.remove_ticker("AAPL").expect("removes");
    let again = scraper.remove_ticker("AAPL").expect("no error");

    // Then: the count drops by one and the data is gone
    assert!(removed);
    assert!(!again);
    assert_eq!(scraper.get_ticker_list().len(), 1);
    assert!(scraper.get_ticker_data("AAPL").is_none());
}

#[tokio::test]
async fn clear_all_empties_the_list() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scraper = offline_scraper(dir.path());
    scraper.add_ticker("AAPL").await.expect("adds");
    scraper.add_ticker("GOOGL").await.expect("adds");

    scraper.clear_all().expect("clears");

    assert!(scraper.get_ticker_list().is_empty());
    assert!(scraper.get_all_data().is_empty());
}

#[tokio::test]
async fn tracked_tickers_survive_a_restart() {
    // Given: a scraper that tracked two tickers
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let mut scraper = offline_scraper(dir.path());
        scraper.add_ticker("MSFT").await.expect("adds");
        scraper.add_ticker("AAPL").await.expect("adds");
    }

    // When: a new scraper opens the same store
    let reopened = offline_scraper(dir.path());

    // Then: order and data are preserved
    let tickers: Vec<&str> = reopened.get_ticker_list().iter().map(Ticker::as_str).collect();
    assert_eq!(tickers, vec!["MSFT", "AAPL"]);
    assert_eq!(reopened.get_all_data().len(), 2);
}

// =============================================================================
// Batches
// =============================================================================

#[tokio::test]
async fn batch_add_isolates_the_bad_entry() {
    // Given: an empty scraper
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scraper = offline_scraper(dir.path());

    // When: a batch with one empty entry is added
    let report = scraper
        .batch_add_tickers(&["AAPL", "", "GOOGL"])
        .await
        .expect("batch runs");

    // Then: exactly the empty entry fails and the rest are added
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].ticker, "");
    assert_eq!(report.added.len() + report.already_exists.len(), 2);
    assert_eq!(scraper.get_ticker_list().len(), 2);
}

#[tokio::test]
async fn batch_add_reports_already_tracked_tickers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scraper = offline_scraper(dir.path());
    scraper.add_ticker("AAPL").await.expect("adds");

    let report = scraper
        .batch_add_tickers(&["AAPL", "MSFT"])
        .await
        .expect("batch runs");

    let already: Vec<&str> = report.already_exists.iter().map(Ticker::as_str).collect();
    let added: Vec<&str> = report.added.iter().map(Ticker::as_str).collect();
    assert_eq!(already, vec!["AAPL"]);
    assert_eq!(added, vec!["MSFT"]);
}

#[tokio::test]
async fn unresolvable_ticker_stays_tracked_without_data() {
    // Given: a single source that always fails and no synthetic fallback
    let dir = tempfile::tempdir().expect("tempdir");
    let source =
        ScriptedSource::failing(SourceId::Yahoo, SourceError::unavailable("no such symbol"));
    let mut scraper = scraper_with(dir.path(), vec![source]);

    // When: a batch is added
    let report = scraper
        .batch_add_tickers(&["ZZZZ"])
        .await
        .expect("batch runs");

    // Then: the ticker is tracked-unresolved and itemized with a reason
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].error.contains("yahoo"));
    assert_eq!(scraper.get_ticker_list().len(), 1);
    assert!(scraper.get_ticker_data("ZZZZ").is_none());
    assert_eq!(scraper.get_stats().unresolved_tickers, 1);
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn refreshing_twice_without_source_changes_keeps_values() {
    // Given: a tracked ticker resolved by the deterministic source
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scraper = offline_scraper(dir.path());
    scraper.add_ticker("AAPL").await.expect("adds");

    // When: everything is refreshed twice
    scraper.refresh(None).await.expect("refreshes");
    let first = scraper.get_ticker_data("AAPL").cloned().expect("cached");
    let report = scraper.refresh(None).await.expect("refreshes");
    let second = scraper.get_ticker_data("AAPL").cloned().expect("cached");

    // Then: field values are unchanged; only the timestamp may move
    assert_eq!(report.refreshed.len(), 1);
    assert!(first.same_values(&second));
    assert!(second.timestamp >= first.timestamp);
}

#[tokio::test]
async fn refresh_replaces_the_record_wholesale() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = ScriptedSource::succeeding(SourceId::Yahoo, 10.0);
    let mut scraper = scraper_with(dir.path(), vec![source.clone()]);
    scraper.add_ticker("AAPL").await.expect("adds");

    source.set_script(Script::Succeed { price: 12.5 });
    scraper.refresh(Some("AAPL")).await.expect("refreshes");

    let record = scraper.get_ticker_data("AAPL").expect("cached");
    assert_eq!(record.price, Some(12.5));
}

#[tokio::test]
async fn failed_refresh_keeps_a_young_record() {
    // Given: a resolved ticker whose source then goes down
    let dir = tempfile::tempdir().expect("tempdir");
    let source = ScriptedSource::succeeding(SourceId::Yahoo, 10.0);
    let mut scraper = scraper_with(dir.path(), vec![source.clone()]);
    scraper.add_ticker("AAPL").await.expect("adds");
    source.set_script(Script::Fail(SourceError::unavailable("down")));

    // When: it is refreshed
    let report = scraper.refresh(None).await.expect("refresh runs");

    // Then: the failure is reported and the fresh record is kept
    assert_eq!(report.failed.len(), 1);
    assert!(report.evicted.is_empty());
    assert_eq!(
        scraper.get_ticker_data("AAPL").and_then(|r| r.price),
        Some(10.0)
    );
}

#[tokio::test]
async fn a_record_kept_after_a_failed_refresh_is_marked_until_the_next_success() {
    // Given: a resolved ticker whose source then goes down
    let dir = tempfile::tempdir().expect("tempdir");
    let source = ScriptedSource::succeeding(SourceId::Yahoo, 10.0);
    let mut api = FinancialDataApi::from_scraper(scraper_with(dir.path(), vec![source.clone()]));
    api.add_ticker("AAPL").await;
    source.set_script(Script::Fail(SourceError::unavailable("down")));

    // When: the refresh fails
    api.refresh(None).await;

    // Then: the data views flag the kept record
    assert!(api.scraper().is_refresh_failed("aapl"));
    let one = serde_json::to_value(api.get_data(Some("AAPL"))).expect("serializes");
    let all = serde_json::to_value(api.get_data(None)).expect("serializes");
    assert_eq!(one["refresh_failed"], serde_json::json!(["AAPL"]));
    assert_eq!(all["refresh_failed"], serde_json::json!(["AAPL"]));

    // When: the source recovers and the ticker is refreshed again
    source.set_script(Script::Succeed { price: 11.0 });
    api.refresh(Some("AAPL")).await;

    // Then: the marker is gone
    assert!(!api.scraper().is_refresh_failed("AAPL"));
    let one = serde_json::to_value(api.get_data(Some("AAPL"))).expect("serializes");
    assert!(one.get("refresh_failed").is_none());
}

#[tokio::test]
async fn failed_refresh_drops_a_record_older_than_the_limit() {
    // Given: a store holding a two-day-old record
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path()).with_max_record_age(Duration::from_secs(24 * 3_600));
    let mut store = RecordStore::new(&config.storage_file);
    let old = FinancialRecord::new(Ticker::parse("AAPL").expect("valid"), SourceId::Yahoo)
        .with_price(Some(10.0))
        .stamped(
            SourceId::Yahoo,
            UtcDateTime::now().earlier_by(Duration::from_secs(48 * 3_600)),
        );
    store.restore(old);
    store.persist().expect("persists");

    let source = ScriptedSource::failing(SourceId::Yahoo, SourceError::unavailable("down"));
    let mut scraper =
        FinancialDataScraper::with_registry(config, registry_of(vec![source])).expect("opens");

    // When: the refresh fails
    let report = scraper.refresh(None).await.expect("refresh runs");

    // Then: the stale record is dropped and the ticker stays tracked-unresolved
    let evicted: Vec<&str> = report.evicted.iter().map(Ticker::as_str).collect();
    assert_eq!(evicted, vec!["AAPL"]);
    assert!(scraper.get_ticker_data("AAPL").is_none());
    assert_eq!(scraper.get_ticker_list().len(), 1);
}

#[tokio::test]
async fn refreshing_an_untracked_ticker_is_reported_not_added() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scraper = offline_scraper(dir.path());

    let report = scraper.refresh(Some("MSFT")).await.expect("refresh runs");

    assert_eq!(report.failed.len(), 1);
    assert!(scraper.get_ticker_list().is_empty());
}

// =============================================================================
// Storage failures
// =============================================================================

#[tokio::test]
async fn a_failed_write_is_reported_and_written_by_the_retry() {
    // Given: a scraper whose store path is taken by a directory
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scraper = offline_scraper(dir.path());
    let store_path = dir.path().join("financial_data.json");
    std::fs::create_dir(&store_path).expect("occupy the store path");

    // When: a ticker is added
    let error = scraper.add_ticker("AAPL").await.expect_err("write fails");

    // Then: the caller learns the change may not be durable
    assert!(matches!(error, ScraperError::Storage(_)));
    assert_eq!(scraper.get_ticker_list().len(), 1);

    // When: the path is freed and the add is retried
    std::fs::remove_dir(&store_path).expect("free the store path");
    let retry = scraper.add_ticker("AAPL").await.expect("retry persists");

    // Then: the earlier change reaches disk
    assert!(matches!(retry, AddOutcome::AlreadyTracked));
    let reopened = offline_scraper(dir.path());
    let tickers: Vec<&str> = reopened.get_ticker_list().iter().map(Ticker::as_str).collect();
    assert_eq!(tickers, vec!["AAPL"]);
    assert!(reopened.get_ticker_data("AAPL").is_some());
}

#[tokio::test]
async fn a_batch_of_known_tickers_still_writes_pending_changes() {
    // Given: a tracked ticker whose write failed
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scraper = offline_scraper(dir.path());
    let store_path = dir.path().join("financial_data.json");
    std::fs::create_dir(&store_path).expect("occupy the store path");
    let error = scraper
        .batch_add_tickers(&["MSFT"])
        .await
        .expect_err("write fails");
    assert!(matches!(error, ScraperError::Storage(_)));
    std::fs::remove_dir(&store_path).expect("free the store path");

    // When: the same batch is sent again
    let report = scraper
        .batch_add_tickers(&["MSFT"])
        .await
        .expect("retry persists");

    // Then: nothing new was added but the store file now holds the ticker
    assert_eq!(report.already_exists.len(), 1);
    assert_eq!(offline_scraper(dir.path()).get_ticker_list().len(), 1);
}

#[tokio::test]
async fn api_reports_a_failed_write_as_a_storage_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut api = FinancialDataApi::from_scraper(offline_scraper(dir.path()));
    std::fs::create_dir(dir.path().join("financial_data.json")).expect("occupy the store path");

    let result = api.add_ticker("AAPL").await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ApiErrorKind::Storage));
}

// =============================================================================
// Stats and lookups
// =============================================================================

#[tokio::test]
async fn stats_describe_store_and_sources() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scraper = offline_scraper(dir.path());
    scraper.add_ticker("AAPL").await.expect("adds");

    let stats = scraper.get_stats();

    assert_eq!(stats.total_tickers, 1);
    assert_eq!(stats.cached_tickers, 1);
    assert_eq!(stats.source_count, 1);
    assert_eq!(stats.data_sources, vec![SourceId::Synthetic]);
    assert!(stats.storage_file.ends_with("financial_data.json"));
    assert!(stats.last_updated.is_some());
}

#[tokio::test]
async fn fetch_without_tracking_leaves_the_store_alone() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scraper = offline_scraper(dir.path());

    let records = scraper
        .fetch_without_tracking(&["AAPL", "BAD-TICKER", "MSFT"])
        .await;

    assert_eq!(records.len(), 2);
    assert!(scraper.get_ticker_list().is_empty());
    assert!(!dir.path().join("financial_data.json").exists());
}

#[tokio::test]
async fn cleanup_keeps_fresh_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut scraper = offline_scraper(dir.path());
    scraper.add_ticker("AAPL").await.expect("adds");

    let evicted = scraper
        .cleanup_stale_data(Duration::from_secs(3_600))
        .expect("cleanup runs");

    assert_eq!(evicted, 0);
    assert!(scraper.get_ticker_data("AAPL").is_some());
}

// =============================================================================
// Result-object API
// =============================================================================

#[tokio::test]
async fn api_reports_success_and_failure_as_objects() {
    // Given: an API over an offline scraper
    let dir = tempfile::tempdir().expect("tempdir");
    let mut api = FinancialDataApi::from_scraper(offline_scraper(dir.path()));

    // When: a ticker is added, re-added and an empty one is tried
    let added = api.add_ticker("AAPL").await;
    let duplicate = api.add_ticker("AAPL").await;
    let invalid = api.add_ticker("").await;

    // Then: each outcome is a serialisable result object
    assert!(added.success);
    assert_eq!(added.message.as_deref(), Some("Successfully added AAPL"));
    assert!(!duplicate.success);
    assert_eq!(duplicate.error_kind, Some(ApiErrorKind::AlreadyExists));
    assert!(!invalid.success);
    assert_eq!(invalid.error_kind, Some(ApiErrorKind::Validation));

    let value = serde_json::to_value(&added).expect("serializes");
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["ticker"], "AAPL");
    assert_eq!(value["source"], "synthetic");
}

#[tokio::test]
async fn api_batch_and_list_shapes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut api = FinancialDataApi::from_scraper(offline_scraper(dir.path()));

    let batch = api.batch_add_tickers(&["AAPL", "", "MSFT"]).await;
    let list = api.get_ticker_list();

    let batch = serde_json::to_value(&batch).expect("serializes");
    assert_eq!(batch["success"], false);
    assert_eq!(batch["failed"][0]["ticker"], "");
    assert_eq!(batch["added"].as_array().map(Vec::len), Some(2));

    let list = serde_json::to_value(&list).expect("serializes");
    assert_eq!(list["count"], 2);
    assert_eq!(list["tickers"][1], "MSFT");
}

#[tokio::test]
async fn api_get_data_for_unknown_ticker_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let api = FinancialDataApi::from_scraper(offline_scraper(dir.path()));

    let result = api.get_data(Some("AAPL"));

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ApiErrorKind::NotFound));
}
