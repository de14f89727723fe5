use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{SourceId, Ticker, UtcDateTime, ValidationError};

/// Resolved snapshot of one ticker's financial attributes.
///
/// Fields a source did not supply are `None` and serialize as `null`.
/// Records are replaced wholesale on refresh; the `with_*` methods are
/// only used while a source adapter is normalizing its response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub ticker: Ticker,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    pub timestamp: UtcDateTime,
    pub source: SourceId,
    #[serde(default)]
    pub synthetic: bool,
}

impl FinancialRecord {
    pub fn new(ticker: Ticker, source: SourceId) -> Self {
        Self {
            ticker,
            company_name: None,
            price: None,
            pe_ratio: None,
            sector: None,
            market_cap: None,
            dividend_yield: None,
            timestamp: UtcDateTime::now(),
            source,
            synthetic: false,
        }
    }

    pub fn with_company_name(mut self, name: Option<String>) -> Self {
        self.company_name = name
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        self
    }

    pub fn with_price(mut self, price: Option<f64>) -> Self {
        self.price = price;
        self
    }

    pub fn with_pe_ratio(mut self, pe_ratio: Option<f64>) -> Self {
        self.pe_ratio = pe_ratio;
        self
    }

    pub fn with_sector(mut self, sector: Option<String>) -> Self {
        self.sector = sector
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        self
    }

    pub fn with_market_cap(mut self, market_cap: Option<f64>) -> Self {
        self.market_cap = market_cap;
        self
    }

    pub fn with_dividend_yield(mut self, dividend_yield: Option<f64>) -> Self {
        self.dividend_yield = dividend_yield;
        self
    }

    pub fn with_synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    /// Annotates the record with the source that produced it and the
    /// acquisition time.
    pub fn stamped(mut self, source: SourceId, timestamp: UtcDateTime) -> Self {
        self.source = source;
        self.timestamp = timestamp;
        self
    }

    /// Checks the numeric invariants. P/E may be negative for loss-making
    /// companies; every other numeric field must be non-negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_optional_non_negative("price", self.price)?;
        validate_optional_finite("pe_ratio", self.pe_ratio)?;
        validate_optional_non_negative("market_cap", self.market_cap)?;
        validate_optional_non_negative("dividend_yield", self.dividend_yield)?;
        if matches!(&self.company_name, Some(name) if name.trim().is_empty()) {
            return Err(ValidationError::EmptyCompanyName);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// True when neither a price nor a company name is present.
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.company_name.is_none()
    }

    pub fn age_at(&self, now: UtcDateTime) -> Duration {
        self.timestamp.age_at(now)
    }

    pub fn is_stale(&self, max_age: Duration, now: UtcDateTime) -> bool {
        self.age_at(now) > max_age
    }

    /// Compares every field except the acquisition timestamp.
    pub fn same_values(&self, other: &Self) -> bool {
        self.ticker == other.ticker
            && self.company_name == other.company_name
            && self.price == other.price
            && self.pe_ratio == other.pe_ratio
            && self.sector == other.sector
            && self.market_cap == other.market_cap
            && self.dividend_yield == other.dividend_yield
            && self.source == other.source
            && self.synthetic == other.synthetic
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

fn validate_optional_finite(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(value) if !value.is_finite() => Err(ValidationError::NonFiniteValue { field }),
        _ => Ok(()),
    }
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    validate_optional_finite(field, value)?;
    match value {
        Some(value) if value < 0.0 => Err(ValidationError::NegativeValue { field }),
        _ => Ok(()),
    }
}
