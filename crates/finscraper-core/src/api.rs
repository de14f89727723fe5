//! Result-object presentation of the scraper facade.
//!
//! Every call returns an [`ApiResult`] that serializes as
//! `{"success": .., "message"|"error": .., ...payload}`. Nothing here
//! resolves or stores data on its own; it only reshapes facade results.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::export::ExportFormat;
use crate::scraper::{AddOutcome, BatchAddReport, FinancialDataScraper, RefreshReport, ScraperStats};
use crate::{
    ExportError, FinancialRecord, PortfolioSummary, ScraperConfig, ScraperError, SourceDescriptor,
    SourceId, Ticker,
};

/// Failure category, used by front ends to pick an exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    Validation,
    AlreadyExists,
    Resolution,
    NotFound,
    PartialFailure,
    Storage,
    Serialization,
    Export,
    FormatUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ApiErrorKind>,
    #[serde(flatten)]
    pub payload: Option<T>,
}

impl<T> ApiResult<T> {
    fn ok(payload: T) -> Self {
        Self {
            success: true,
            message: None,
            error: None,
            error_kind: None,
            payload: Some(payload),
        }
    }

    fn failed(kind: ApiErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            error_kind: Some(kind),
            payload: None,
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn with_payload(mut self, payload: T) -> Self {
        self.payload = Some(payload);
        self
    }

    fn from_scraper_error(error: ScraperError) -> Self {
        let kind = match &error {
            ScraperError::Validation(_) => ApiErrorKind::Validation,
            ScraperError::Storage(_) => ApiErrorKind::Storage,
        };
        Self::failed(kind, error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddTickerPayload {
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<FinancialRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovePayload {
    pub ticker: String,
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerListPayload {
    pub tickers: Vec<Ticker>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataView {
    All(Vec<FinancialRecord>),
    One(FinancialRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPayload {
    pub data: DataView,
    pub count: usize,
    /// Tickers in `data` whose last refresh failed; their values are older
    /// than the last refresh attempt.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub refresh_failed: Vec<Ticker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatePayload {
    pub ticker: String,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPayload {
    pub filename: String,
    pub format: ExportFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsPayload {
    pub stats: ScraperStats,
    pub features: BTreeMap<&'static str, bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPayload {
    pub summary: PortfolioSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupPayload {
    pub removed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcesPayload {
    pub sources: Vec<SourceDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearPayload {}

/// Result-object API over [`FinancialDataScraper`].
#[derive(Debug)]
pub struct FinancialDataApi {
    scraper: FinancialDataScraper,
}

impl FinancialDataApi {
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        Ok(Self::from_scraper(FinancialDataScraper::new(config)?))
    }

    pub fn from_scraper(scraper: FinancialDataScraper) -> Self {
        Self { scraper }
    }

    pub fn scraper(&self) -> &FinancialDataScraper {
        &self.scraper
    }

    pub async fn add_ticker(&mut self, input: &str) -> ApiResult<AddTickerPayload> {
        let outcome = match self.scraper.add_ticker(input).await {
            Ok(outcome) => outcome,
            Err(error) => return ApiResult::from_scraper_error(error),
        };

        let ticker = input.trim().to_ascii_uppercase();
        match outcome {
            AddOutcome::Added(resolution) => ApiResult::ok(AddTickerPayload {
                ticker: ticker.clone(),
                data: Some(resolution.record),
                source: Some(resolution.selected_source),
                warnings: resolution.warnings,
            })
            .with_message(format!("Successfully added {ticker}")),
            AddOutcome::AddedUnresolved(failure) => {
                ApiResult::failed(ApiErrorKind::Resolution, failure.reason())
                    .with_message(format!("{ticker} is tracked but could not be resolved"))
                    .with_payload(AddTickerPayload {
                        ticker,
                        data: None,
                        source: None,
                        warnings: Vec::new(),
                    })
            }
            AddOutcome::AlreadyTracked => ApiResult::failed(
                ApiErrorKind::AlreadyExists,
                format!("Ticker {ticker} already exists"),
            ),
        }
    }

    pub async fn batch_add_tickers<S>(&mut self, inputs: &[S]) -> ApiResult<BatchAddReport>
    where
        S: AsRef<str>,
    {
        match self.scraper.batch_add_tickers(inputs).await {
            Ok(report) if report.failed.is_empty() => {
                let message = format!(
                    "Added {} ticker(s), {} already tracked",
                    report.added.len(),
                    report.already_exists.len()
                );
                ApiResult::ok(report).with_message(message)
            }
            Ok(report) => ApiResult::failed(
                ApiErrorKind::PartialFailure,
                format!("{} ticker(s) failed", report.failed.len()),
            )
            .with_payload(report),
            Err(error) => ApiResult::from_scraper_error(error),
        }
    }

    pub fn remove_ticker(&mut self, input: &str) -> ApiResult<RemovePayload> {
        match self.scraper.remove_ticker(input) {
            Ok(removed) => {
                let ticker = input.trim().to_ascii_uppercase();
                let message = if removed {
                    format!("Removed {ticker}")
                } else {
                    format!("{ticker} was not tracked")
                };
                ApiResult::ok(RemovePayload { ticker, removed }).with_message(message)
            }
            Err(error) => ApiResult::from_scraper_error(error),
        }
    }

    pub fn get_ticker_list(&self) -> ApiResult<TickerListPayload> {
        let tickers = self.scraper.get_ticker_list().to_vec();
        ApiResult::ok(TickerListPayload {
            count: tickers.len(),
            tickers,
        })
    }

    /// All cached records, or one ticker's record.
    pub fn get_data(&self, ticker: Option<&str>) -> ApiResult<DataPayload> {
        let Some(input) = ticker else {
            let data = self.scraper.get_all_data();
            return ApiResult::ok(DataPayload {
                count: data.len(),
                data: DataView::All(data),
                refresh_failed: self.scraper.refresh_failed_tickers().cloned().collect(),
            });
        };

        if let Err(error) = Ticker::parse(input) {
            return ApiResult::failed(ApiErrorKind::Validation, error.to_string());
        }
        match self.scraper.get_ticker_data(input) {
            Some(record) => ApiResult::ok(DataPayload {
                refresh_failed: if self.scraper.is_refresh_failed(input) {
                    vec![record.ticker.clone()]
                } else {
                    Vec::new()
                },
                data: DataView::One(record.clone()),
                count: 1,
            }),
            None => ApiResult::failed(
                ApiErrorKind::NotFound,
                format!("No data found for {}", input.trim().to_ascii_uppercase()),
            ),
        }
    }

    pub async fn refresh(&mut self, ticker: Option<&str>) -> ApiResult<RefreshReport> {
        match self.scraper.refresh(ticker).await {
            Ok(report) if report.failed.is_empty() => {
                let message = format!("Refreshed {} ticker(s)", report.refreshed.len());
                ApiResult::ok(report).with_message(message)
            }
            Ok(report) => ApiResult::failed(
                ApiErrorKind::PartialFailure,
                format!("{} ticker(s) failed to refresh", report.failed.len()),
            )
            .with_payload(report),
            Err(error) => ApiResult::from_scraper_error(error),
        }
    }

    pub fn validate_ticker(&self, input: &str) -> ApiResult<ValidatePayload> {
        ApiResult::ok(ValidatePayload {
            ticker: input.to_owned(),
            valid: self.scraper.validate_ticker(input),
        })
    }

    pub fn export_data(&self, format: &str, path: Option<&Path>) -> ApiResult<ExportPayload> {
        let format = match format.parse::<ExportFormat>() {
            Ok(format) => format,
            Err(error) => return ApiResult::failed(ApiErrorKind::Validation, error.to_string()),
        };

        match self.scraper.export_data(format, path) {
            Ok(path) => {
                let filename = path.display().to_string();
                ApiResult::ok(ExportPayload {
                    filename: filename.clone(),
                    format,
                })
                .with_message(format!("Exported {format} to {filename}"))
            }
            Err(error) => {
                let kind = match &error {
                    ExportError::FormatUnavailable(_) => ApiErrorKind::FormatUnavailable,
                    ExportError::UnknownFormat(_) => ApiErrorKind::Validation,
                    ExportError::Json(_) => ApiErrorKind::Serialization,
                    _ => ApiErrorKind::Export,
                };
                ApiResult::failed(kind, error.to_string())
            }
        }
    }

    pub fn get_stats(&self) -> ApiResult<StatsPayload> {
        ApiResult::ok(StatsPayload {
            stats: self.scraper.get_stats(),
            features: self.scraper.available_features(),
        })
    }

    pub fn get_summary(&self) -> ApiResult<SummaryPayload> {
        ApiResult::ok(SummaryPayload {
            summary: self.scraper.summary(),
        })
    }

    pub fn get_sources(&self) -> ApiResult<SourcesPayload> {
        ApiResult::ok(SourcesPayload {
            sources: self.scraper.registry().descriptors().to_vec(),
        })
    }

    pub fn cleanup_stale_data(&mut self, max_age_hours: u64) -> ApiResult<CleanupPayload> {
        let max_age = Duration::from_secs(max_age_hours.saturating_mul(3_600));
        match self.scraper.cleanup_stale_data(max_age) {
            Ok(removed) => ApiResult::ok(CleanupPayload { removed })
                .with_message(format!("Removed {removed} stale record(s)")),
            Err(error) => ApiResult::from_scraper_error(error),
        }
    }

    pub fn clear_all(&mut self) -> ApiResult<ClearPayload> {
        match self.scraper.clear_all() {
            Ok(()) => ApiResult::ok(ClearPayload {}).with_message("Cleared all data"),
            Err(error) => ApiResult::from_scraper_error(error),
        }
    }
}
