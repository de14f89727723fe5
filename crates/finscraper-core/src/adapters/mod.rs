//! Source adapters.
//!
//! | Adapter | Source | Network |
//! |---------|--------|---------|
//! | [`YahooAdapter`] | Yahoo Finance quote summary | yes |
//! | [`AlphaVantageAdapter`] | Alpha Vantage overview + global quote | yes, needs a key |
//! | [`SyntheticAdapter`] | Deterministic generated values | no |

mod alphavantage;
mod synthetic;
mod yahoo;

pub use alphavantage::AlphaVantageAdapter;
pub use synthetic::SyntheticAdapter;
pub use yahoo::YahooAdapter;
