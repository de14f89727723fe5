//! Source adapter contract and its structured failure type.
//!
//! Every provider implements [`DataSource`]: given a [`Ticker`] it either
//! produces a normalized [`FinancialRecord`] or reports a [`SourceError`]
//! the resolver can act on. Adapters never panic on bad upstream data and
//! never hold stored records.
//!
//! # Example
//!
//! ```rust,ignore
//! use finscraper_core::{DataSource, SyntheticAdapter, Ticker};
//!
//! async fn lookup(adapter: &SyntheticAdapter) {
//!     let ticker = Ticker::parse("AAPL").expect("valid ticker");
//!     match adapter.fetch(&ticker).await {
//!         Ok(record) => println!("{}: {:?}", record.ticker, record.price),
//!         Err(error) => eprintln!("{} failed: {error}", adapter.id()),
//!     }
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{FinancialRecord, SourceId, Ticker};

/// Boxed future returned by [`DataSource::fetch`].
pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<FinancialRecord, SourceError>> + Send + 'a>>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    Timeout,
    MalformedResponse,
    MissingFields,
    NotFound,
    Internal,
}

/// Structured source error collected by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: format!("no response within {timeout_ms} ms"),
            retryable: true,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::MalformedResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn missing_fields(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::MissingFields,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn not_found(ticker: &Ticker) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: format!("no data for ticker '{ticker}'"),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::MalformedResponse => "source.malformed_response",
            SourceErrorKind::MissingFields => "source.missing_fields",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`; the registry shares them behind
/// `Arc`. The resolver applies its own per-attempt timeout on top of any
/// transport timeout the adapter sets.
pub trait DataSource: Send + Sync {
    /// Returns the unique source identifier.
    fn id(&self) -> SourceId;

    /// Fetches and normalizes a snapshot for `ticker`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the provider is unreachable, rate
    /// limited, returns an unparseable payload, or lacks the fields needed
    /// to build a record.
    fn fetch<'a>(&'a self, ticker: &'a Ticker) -> FetchFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_and_display_includes_them() {
        let error = SourceError::rate_limited("quota exhausted");
        assert_eq!(error.code(), "source.rate_limited");
        assert!(error.retryable());
        assert_eq!(error.to_string(), "quota exhausted (source.rate_limited)");
    }

    #[test]
    fn not_found_names_the_ticker() {
        let ticker = Ticker::parse("ZZZZ").expect("valid");
        let error = SourceError::not_found(&ticker);
        assert_eq!(error.kind(), SourceErrorKind::NotFound);
        assert!(error.message().contains("ZZZZ"));
        assert!(!error.retryable());
    }
}
