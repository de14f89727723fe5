//! # Finscraper Core
//!
//! Ticker tracking engine: validates symbols, resolves them through an
//! ordered chain of data sources with fallback, and keeps the results in a
//! persistent JSON store.
//!
//! ## Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `default` | JSON and CSV export |
//! | `xlsx` | Excel export via `rust_xlsxwriter` |
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Source adapters (Yahoo, Alpha Vantage, synthetic) |
//! | [`api`] | Result-object presentation layer |
//! | [`config`] | Scraper and source configuration |
//! | [`data_source`] | Adapter trait and structured source errors |
//! | [`domain`] | Ticker, record and timestamp types |
//! | [`error`] | Error types |
//! | [`export`] | JSON/CSV/XLSX snapshot export |
//! | [`http_client`] | HTTP client abstraction |
//! | [`registry`] | Capability registry of enabled sources |
//! | [`resolver`] | Priority-ordered source chain |
//! | [`scraper`] | The facade tying it together |
//! | [`source`] | Source identifiers and descriptors |
//! | [`store`] | Durable ticker → record store |
//! | [`summary`] | Portfolio summary statistics |
//! | [`throttling`] | Client-side request budgets |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use finscraper_core::{FinancialDataScraper, ScraperConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scraper = FinancialDataScraper::new(ScraperConfig::from_env())?;
//!     let outcome = scraper.add_ticker("AAPL").await?;
//!     if let Some(record) = scraper.get_ticker_data("AAPL") {
//!         println!("{} {:?} (added: {})", record.ticker, record.price, outcome.is_added());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / API      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Scraper Facade  │────▶│ Record Store     │
//! └────────┬────────┘     │ (JSON file)      │
//!          │              └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Source Resolver │────▶│ Source Registry  │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Data Source     │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Adapter failures are [`SourceError`]s and never leave the resolver
//! except inside a [`ResolutionFailure`]. The facade itself only fails with
//! [`ScraperError`]: bad input, or a store write that did not complete.
//!
//! ```rust
//! use finscraper_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::RateLimited => "try later",
//!         SourceErrorKind::NotFound => "unknown symbol",
//!         _ => "source failed",
//!     }
//! }
//! ```

pub mod adapters;
pub mod api;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod export;
pub mod http_client;
pub mod registry;
pub mod resolver;
pub mod scraper;
pub mod source;
pub mod store;
pub mod summary;
pub mod throttling;

// Adapter implementations
pub use adapters::{AlphaVantageAdapter, SyntheticAdapter, YahooAdapter};

// Presentation layer
pub use api::{ApiErrorKind, ApiResult, FinancialDataApi};

// Configuration
pub use config::{ScraperConfig, SourceConfig, DEFAULT_MAX_RECORD_AGE, DEFAULT_STORAGE_FILE};

// Data source trait and types
pub use data_source::{DataSource, FetchFuture, SourceError, SourceErrorKind};

// Domain models
pub use domain::{validate_ticker, FinancialRecord, Ticker, UtcDateTime, MAX_TICKER_LEN};

// Error types
pub use error::{ExportError, ScraperError, StoreError, ValidationError};

// Export
pub use export::{read_json_export, ExportFormat};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Registry and resolution
pub use registry::{SourceRegistry, SourceRegistryBuilder};
pub use resolver::{Resolution, ResolutionFailure, ResolveResult, SourceAttempt, SourceResolver};

// Facade
pub use scraper::{
    AddOutcome, BatchAddReport, FailedTicker, FinancialDataScraper, RefreshReport, ScraperStats,
};

// Source identifiers
pub use source::{SourceDescriptor, SourceId};

// Storage and summaries
pub use store::RecordStore;
pub use summary::{PortfolioSummary, ValueRange};

// Throttling
pub use throttling::RequestBudget;
