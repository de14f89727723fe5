//! # Domain Models
//!
//! Canonical types shared by every layer of the scraper.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Validated, uppercase ticker symbol |
//! | [`FinancialRecord`] | One ticker's resolved snapshot |
//! | [`UtcDateTime`] | RFC3339 UTC acquisition timestamp |
//!
//! Construction enforces the invariants: a [`Ticker`] cannot hold an
//! empty, overlong or malformed symbol, and a [`UtcDateTime`] is always UTC.

mod record;
mod ticker;
mod timestamp;

pub use record::FinancialRecord;
pub use ticker::{validate_ticker, Ticker, MAX_TICKER_LEN};
pub use timestamp::UtcDateTime;
