use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::data_source::{DataSource, SourceError};
use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::{FinancialRecord, SourceId, SourceRegistry, Ticker, UtcDateTime};

/// One failed adapter attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceAttempt {
    pub source: SourceId,
    pub code: &'static str,
    pub error: String,
    /// Whether the same source may succeed if asked again later.
    pub retryable: bool,
}

impl SourceAttempt {
    fn new(source: SourceId, error: &SourceError) -> Self {
        Self {
            source,
            code: error.code(),
            error: error.message().to_owned(),
            retryable: error.retryable(),
        }
    }
}

/// Successful resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: FinancialRecord,
    pub selected_source: SourceId,
    pub source_chain: Vec<SourceId>,
    pub attempts: Vec<SourceAttempt>,
    pub warnings: Vec<String>,
    pub latency_ms: u64,
}

/// Every enabled adapter failed for a ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionFailure {
    pub ticker: Ticker,
    pub source_chain: Vec<SourceId>,
    pub attempts: Vec<SourceAttempt>,
    pub latency_ms: u64,
}

impl ResolutionFailure {
    /// Human-readable reason naming every attempted source.
    pub fn reason(&self) -> String {
        if self.attempts.is_empty() {
            return String::from("no data sources are enabled");
        }
        let details = self
            .attempts
            .iter()
            .map(|attempt| format!("{}: {}", attempt.source, attempt.error))
            .collect::<Vec<_>>()
            .join("; ");
        format!("all sources failed ({details})")
    }
}

impl std::fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.ticker, self.reason())
    }
}

impl std::error::Error for ResolutionFailure {}

pub type ResolveResult = Result<Resolution, ResolutionFailure>;

/// Drives the enabled adapters in priority order until one produces a
/// record.
///
/// The order is fixed by the registry. Past successes or failures never
/// reorder the chain.
#[derive(Clone)]
pub struct SourceResolver {
    adapters: Vec<Arc<dyn DataSource>>,
    attempt_timeout: Duration,
}

impl SourceResolver {
    pub fn new(registry: &SourceRegistry) -> Self {
        Self::from_adapters(registry.adapters().to_vec())
    }

    /// Adapters are attempted in the order given.
    pub fn from_adapters(adapters: Vec<Arc<dyn DataSource>>) -> Self {
        Self {
            adapters,
            attempt_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn source_chain(&self) -> Vec<SourceId> {
        self.adapters.iter().map(|adapter| adapter.id()).collect()
    }

    pub async fn resolve(&self, ticker: &Ticker) -> ResolveResult {
        let started = Instant::now();
        let mut source_chain = Vec::with_capacity(self.adapters.len());
        let mut attempts = Vec::new();

        for adapter in &self.adapters {
            let source = adapter.id();
            source_chain.push(source);
            log::debug!("resolving {ticker} via {source}");

            match self.attempt(adapter.as_ref(), ticker).await {
                Ok(record) => {
                    let record = record.stamped(source, UtcDateTime::now());
                    let mut warnings = Vec::new();
                    if !attempts.is_empty() {
                        warnings.push(format!(
                            "source fallback succeeded with '{source}' after {} failed attempt(s)",
                            attempts.len()
                        ));
                    }
                    if record.synthetic {
                        warnings.push(format!("{ticker} uses synthetic placeholder values"));
                        log::warn!("{ticker}: live sources unavailable, using synthetic values");
                    }
                    log::info!("resolved {ticker} via {source}");

                    return Ok(Resolution {
                        record,
                        selected_source: source,
                        source_chain,
                        attempts,
                        warnings,
                        latency_ms: elapsed_ms(started),
                    });
                }
                Err(error) => {
                    log::warn!("{source} failed for {ticker}: {error}");
                    attempts.push(SourceAttempt::new(source, &error));
                }
            }
        }

        Err(ResolutionFailure {
            ticker: ticker.clone(),
            source_chain,
            attempts,
            latency_ms: elapsed_ms(started),
        })
    }

    /// Resolves each ticker independently, in order.
    pub async fn resolve_many(&self, tickers: &[Ticker]) -> Vec<ResolveResult> {
        let mut results = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            results.push(self.resolve(ticker).await);
        }
        results
    }

    async fn attempt(
        &self,
        adapter: &dyn DataSource,
        ticker: &Ticker,
    ) -> Result<FinancialRecord, SourceError> {
        let record = tokio::time::timeout(self.attempt_timeout, adapter.fetch(ticker))
            .await
            .map_err(|_| SourceError::timeout(duration_ms(self.attempt_timeout)))??;

        // A record for another symbol would end up under the wrong key.
        if record.ticker != *ticker {
            return Err(SourceError::malformed(format!(
                "source returned data for '{}' instead of '{ticker}'",
                record.ticker
            )));
        }
        if record.is_empty() {
            return Err(SourceError::missing_fields(
                "record has neither a price nor a company name",
            ));
        }
        record
            .validate()
            .map_err(|e| SourceError::malformed(e.to_string()))?;
        Ok(record)
    }
}

impl std::fmt::Debug for SourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceResolver")
            .field("source_chain", &self.source_chain())
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn elapsed_ms(started: Instant) -> u64 {
    duration_ms(started.elapsed())
}
