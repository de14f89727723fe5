use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::export::{default_export_path, export_records, ExportFormat};
use crate::{
    ExportError, FinancialRecord, PortfolioSummary, RecordStore, Resolution, ResolutionFailure,
    ScraperConfig, ScraperError, SourceId, SourceRegistry, SourceResolver, Ticker, UtcDateTime,
};

/// Result of adding one ticker.
#[derive(Debug, Clone)]
pub enum AddOutcome {
    /// Newly tracked and resolved.
    Added(Resolution),
    /// Newly tracked, but every source failed; the ticker stays unresolved.
    AddedUnresolved(ResolutionFailure),
    AlreadyTracked,
}

impl AddOutcome {
    /// True only for a newly added, resolved ticker.
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }
}

/// A ticker that could not be added or refreshed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTicker {
    pub ticker: String,
    pub error: String,
}

impl FailedTicker {
    fn new(ticker: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchAddReport {
    pub added: Vec<Ticker>,
    pub failed: Vec<FailedTicker>,
    pub already_exists: Vec<Ticker>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub refreshed: Vec<Ticker>,
    pub failed: Vec<FailedTicker>,
    /// Tickers whose old record was too old to keep after a failed refresh.
    pub evicted: Vec<Ticker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScraperStats {
    pub total_tickers: usize,
    pub cached_tickers: usize,
    pub unresolved_tickers: usize,
    pub source_count: usize,
    pub data_sources: Vec<SourceId>,
    pub storage_file: String,
    pub last_updated: Option<UtcDateTime>,
}

/// Tracks tickers, resolves them through the source chain and keeps the
/// results in a persistent store.
///
/// Every mutating call persists before returning, including any change an
/// earlier call failed to write. The facade owns its store, so `&mut self`
/// is the single writer.
#[derive(Debug)]
pub struct FinancialDataScraper {
    config: ScraperConfig,
    registry: SourceRegistry,
    resolver: SourceResolver,
    store: RecordStore,
    /// Tickers whose last refresh failed but whose older record was kept.
    refresh_failed: BTreeSet<Ticker>,
}

impl FinancialDataScraper {
    /// Builds the production registry from `config` and loads the store.
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        let registry = SourceRegistry::from_config(&config.sources, config.timeout_ms);
        Self::with_registry(config, registry)
    }

    pub fn with_registry(
        config: ScraperConfig,
        registry: SourceRegistry,
    ) -> Result<Self, ScraperError> {
        let resolver = SourceResolver::new(&registry)
            .with_attempt_timeout(Duration::from_millis(config.timeout_ms));
        let store = RecordStore::open(&config.storage_file)?;
        log::debug!(
            "scraper ready: {} tracked, chain {:?}",
            store.len(),
            resolver.source_chain()
        );

        Ok(Self {
            config,
            registry,
            resolver,
            store,
            refresh_failed: BTreeSet::new(),
        })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn storage_file(&self) -> &Path {
        self.store.path()
    }

    pub fn validate_ticker(&self, input: &str) -> bool {
        crate::validate_ticker(input)
    }

    pub async fn add_ticker(&mut self, input: &str) -> Result<AddOutcome, ScraperError> {
        let ticker = Ticker::parse(input)?;
        let outcome = self.add_parsed(ticker).await;
        self.store.persist_if_dirty()?;
        Ok(outcome)
    }

    /// Adds each input independently; one bad ticker never aborts the rest.
    /// The store is persisted once at the end.
    pub async fn batch_add_tickers<S>(&mut self, inputs: &[S]) -> Result<BatchAddReport, ScraperError>
    where
        S: AsRef<str>,
    {
        let mut report = BatchAddReport::default();

        for input in inputs {
            let input = input.as_ref();
            let ticker = match Ticker::parse(input) {
                Ok(ticker) => ticker,
                Err(error) => {
                    report.failed.push(FailedTicker::new(input, error.to_string()));
                    continue;
                }
            };

            match self.add_parsed(ticker.clone()).await {
                AddOutcome::Added(_) => report.added.push(ticker),
                AddOutcome::AddedUnresolved(failure) => {
                    report.failed.push(FailedTicker::new(ticker.as_str(), failure.reason()));
                }
                AddOutcome::AlreadyTracked => report.already_exists.push(ticker),
            }
        }

        self.store.persist_if_dirty()?;
        Ok(report)
    }

    async fn add_parsed(&mut self, ticker: Ticker) -> AddOutcome {
        if self.store.is_tracked(&ticker) {
            return AddOutcome::AlreadyTracked;
        }

        let result = self.resolver.resolve(&ticker).await;
        self.store.track(ticker);
        match result {
            Ok(resolution) => {
                self.store.put(resolution.record.clone());
                AddOutcome::Added(resolution)
            }
            Err(failure) => {
                log::warn!("{failure}");
                AddOutcome::AddedUnresolved(failure)
            }
        }
    }

    /// Untracks `input`. Returns false if it was not tracked.
    pub fn remove_ticker(&mut self, input: &str) -> Result<bool, ScraperError> {
        let ticker = Ticker::parse(input)?;
        let removed = self.store.remove(&ticker);
        self.refresh_failed.remove(&ticker);
        self.store.persist_if_dirty()?;
        if removed {
            log::info!("removed {ticker}");
        }
        Ok(removed)
    }

    /// Cached records in tracked order.
    pub fn get_all_data(&self) -> Vec<FinancialRecord> {
        self.store.records().cloned().collect()
    }

    /// Absent for untracked, unresolved or malformed input.
    pub fn get_ticker_data(&self, input: &str) -> Option<&FinancialRecord> {
        let ticker = Ticker::parse(input).ok()?;
        self.store.get(&ticker)
    }

    pub fn get_ticker_list(&self) -> &[Ticker] {
        self.store.list_tickers()
    }

    /// True when the cached record for `input` outlived a failed refresh.
    pub fn is_refresh_failed(&self, input: &str) -> bool {
        Ticker::parse(input).is_ok_and(|ticker| self.refresh_failed.contains(&ticker))
    }

    /// Tickers whose cached record outlived a failed refresh, in ticker order.
    pub fn refresh_failed_tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.refresh_failed.iter()
    }

    /// Re-resolves one tracked ticker, or all of them when `target` is
    /// `None`.
    ///
    /// On failure the previous record is kept only while it is younger than
    /// `max_record_age`; older ones are dropped so stale data is never
    /// served unflagged.
    pub async fn refresh(&mut self, target: Option<&str>) -> Result<RefreshReport, ScraperError> {
        let tickers = match target {
            Some(input) => vec![Ticker::parse(input)?],
            None => self.store.list_tickers().to_vec(),
        };

        let mut report = RefreshReport::default();
        for ticker in tickers {
            if !self.store.is_tracked(&ticker) {
                report
                    .failed
                    .push(FailedTicker::new(ticker.as_str(), "ticker is not tracked"));
                continue;
            }

            match self.resolver.resolve(&ticker).await {
                Ok(resolution) => {
                    self.store.put(resolution.record);
                    self.refresh_failed.remove(&ticker);
                    report.refreshed.push(ticker);
                }
                Err(failure) => {
                    let now = UtcDateTime::now();
                    let too_old = self
                        .store
                        .get(&ticker)
                        .is_some_and(|record| record.is_stale(self.config.max_record_age, now));
                    if too_old {
                        self.store.evict(&ticker);
                        self.refresh_failed.remove(&ticker);
                        log::warn!("{ticker}: refresh failed and cached record is too old, dropped");
                        report.evicted.push(ticker.clone());
                    } else if self.store.get(&ticker).is_some() {
                        self.refresh_failed.insert(ticker.clone());
                    }
                    report
                        .failed
                        .push(FailedTicker::new(ticker.as_str(), failure.reason()));
                }
            }
        }

        self.store.persist_if_dirty()?;
        Ok(report)
    }

    pub fn clear_all(&mut self) -> Result<(), ScraperError> {
        self.store.clear();
        self.refresh_failed.clear();
        self.store.persist()?;
        log::info!("cleared all tracked tickers");
        Ok(())
    }

    pub fn get_stats(&self) -> ScraperStats {
        ScraperStats {
            total_tickers: self.store.len(),
            cached_tickers: self.store.cached_len(),
            unresolved_tickers: self.store.unresolved().count(),
            source_count: self.registry.source_count(),
            data_sources: self.registry.enabled().map(|d| d.id).collect(),
            storage_file: self.store.path().display().to_string(),
            last_updated: self.store.last_updated(),
        }
    }

    /// Evicts records older than `max_age`; tickers stay tracked. Returns
    /// the number of records evicted.
    pub fn cleanup_stale_data(&mut self, max_age: Duration) -> Result<usize, ScraperError> {
        let evicted = self.store.cleanup_stale(max_age);
        for ticker in &evicted {
            self.refresh_failed.remove(ticker);
        }
        self.store.persist_if_dirty()?;
        Ok(evicted.len())
    }

    pub fn available_features(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([
            ("json_export", ExportFormat::Json.is_available()),
            ("csv_export", ExportFormat::Csv.is_available()),
            ("xlsx_export", ExportFormat::Xlsx.is_available()),
            ("live_sources", self.registry.has_live_sources()),
            ("alphavantage", self.registry.is_enabled(SourceId::Alphavantage)),
        ])
    }

    /// Resolves tickers without tracking or storing them. Invalid and
    /// unresolvable tickers are skipped.
    pub async fn fetch_without_tracking<S>(&self, inputs: &[S]) -> Vec<FinancialRecord>
    where
        S: AsRef<str>,
    {
        let tickers: Vec<Ticker> = inputs
            .iter()
            .filter_map(|input| match Ticker::parse(input.as_ref()) {
                Ok(ticker) => Some(ticker),
                Err(error) => {
                    log::warn!("skipping {:?}: {error}", input.as_ref());
                    None
                }
            })
            .collect();

        self.resolver
            .resolve_many(&tickers)
            .await
            .into_iter()
            .filter_map(|result| result.ok().map(|resolution| resolution.record))
            .collect()
    }

    /// Exports the current snapshot. Without `path` the file lands next to
    /// the store as `financial_data_<YYYYMMDD_HHMMSS>.<ext>`.
    pub fn export_data(
        &self,
        format: ExportFormat,
        path: Option<&Path>,
    ) -> Result<PathBuf, ExportError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_export_path(&self.export_dir(), format, UtcDateTime::now()),
        };
        export_records(&self.get_all_data(), format, &path)?;
        Ok(path)
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary::from_records(self.store.records())
    }

    fn export_dir(&self) -> PathBuf {
        match self.store.path().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
