use std::path::PathBuf;

use thiserror::Error;

/// Validation errors for tickers, identifiers and user-supplied names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker must start with an ASCII letter: '{ch}'")]
    TickerInvalidStart { ch: char },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("invalid source '{value}', expected one of yahoo, alphavantage, synthetic")]
    InvalidSource { value: String },
    #[error("invalid export format '{value}', expected one of json, csv, xlsx")]
    InvalidExportFormat { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("company name cannot be empty")]
    EmptyCompanyName,
}

/// Failure reading or writing the durable store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write store '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store '{path}' is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors surfaced by the scraper facade.
///
/// Adapter failures never appear here: they are folded into a
/// [`ResolutionFailure`](crate::ResolutionFailure) by the resolver.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The in-memory state changed but may not have reached disk.
    #[error("change may not have survived a crash: {0}")]
    Storage(#[from] StoreError),
}

/// Errors produced by the export collaborator.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export format '{0}' is unavailable in this build")]
    FormatUnavailable(&'static str),

    #[error(transparent)]
    UnknownFormat(#[from] ValidationError),

    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json export error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "xlsx")]
    #[error("xlsx export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
