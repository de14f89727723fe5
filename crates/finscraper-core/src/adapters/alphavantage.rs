use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::data_source::{DataSource, FetchFuture, SourceError};
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::throttling::RequestBudget;
use crate::{FinancialRecord, SourceId, Ticker};

const QUERY_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage source: company overview plus a global quote for price.
///
/// Each lookup spends two calls of the shared [`RequestBudget`]; once the
/// budget is gone the adapter reports `RateLimited` without touching the
/// network.
#[derive(Clone)]
pub struct AlphaVantageAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    budget: RequestBudget,
    timeout_ms: u64,
}

impl AlphaVantageAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            budget: RequestBudget::alphavantage_free_tier(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_budget(mut self, budget: RequestBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    async fn query(
        &self,
        function: &str,
        ticker: &Ticker,
    ) -> Result<serde_json::Value, SourceError> {
        if let Err(retry_in) = self.budget.try_acquire() {
            return Err(SourceError::rate_limited(format!(
                "alphavantage request budget exhausted; retry in {:.2}s",
                retry_in.as_secs_f64()
            )));
        }

        let request = HttpRequest::get(QUERY_URL)
            .with_query("function", function)
            .with_query("symbol", ticker.as_str())
            .with_query("apikey", self.api_key.as_str())
            .with_timeout_ms(self.timeout_ms);
        log::debug!("alphavantage GET {}", request.redacted_url());

        let response = self.http_client.execute(request).await.map_err(|e| {
            if e.timed_out() {
                SourceError::timeout(self.timeout_ms)
            } else {
                SourceError::unavailable(format!("alphavantage transport error: {}", e.message()))
            }
        })?;

        if response.status == 429 {
            return Err(SourceError::rate_limited("alphavantage returned status 429"));
        }
        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "alphavantage returned status {}",
                response.status
            )));
        }

        let body: serde_json::Value = serde_json::from_str(&response.body).map_err(|e| {
            SourceError::malformed(format!("failed to parse alphavantage {function}: {e}"))
        })?;
        check_service_messages(&body)?;
        Ok(body)
    }
}

impl DataSource for AlphaVantageAdapter {
    fn id(&self) -> SourceId {
        SourceId::Alphavantage
    }

    fn fetch<'a>(&'a self, ticker: &'a Ticker) -> FetchFuture<'a> {
        Box::pin(async move {
            let overview = self.query("OVERVIEW", ticker).await?;
            let overview = parse_overview(ticker, overview)?;
            let quote = self.query("GLOBAL_QUOTE", ticker).await?;
            let price = parse_global_quote_price(quote)?;

            let record = FinancialRecord::new(ticker.clone(), SourceId::Alphavantage)
                .with_company_name(overview.name)
                .with_sector(overview.sector)
                .with_price(price)
                .with_pe_ratio(numeric(overview.pe_ratio.as_deref()))
                .with_market_cap(numeric(overview.market_capitalization.as_deref()))
                .with_dividend_yield(numeric(overview.dividend_yield.as_deref()));

            if record.is_empty() {
                return Err(SourceError::missing_fields(
                    "alphavantage response has neither a price nor a company name",
                ));
            }
            record.validate().map_err(|e| {
                SourceError::malformed(format!("alphavantage returned invalid values: {e}"))
            })?;
            Ok(record)
        })
    }
}

/// Alpha Vantage answers throttling and key problems with HTTP 200 and a
/// `Note`, `Information` or `Error Message` field instead of data.
fn check_service_messages(body: &serde_json::Value) -> Result<(), SourceError> {
    let text = |key: &str| body.get(key).and_then(serde_json::Value::as_str);

    if let Some(note) = text("Note").or_else(|| text("Information")) {
        return Err(SourceError::rate_limited(format!("alphavantage: {note}")));
    }
    if let Some(message) = text("Error Message") {
        return Err(SourceError::unavailable(format!("alphavantage: {message}")));
    }
    Ok(())
}

fn parse_overview(
    ticker: &Ticker,
    body: serde_json::Value,
) -> Result<AlphaVantageOverview, SourceError> {
    // Unknown symbols come back as `{}`.
    if body.as_object().is_some_and(|object| object.is_empty()) {
        return Err(SourceError::not_found(ticker));
    }
    serde_json::from_value(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse alphavantage overview: {e}")))
}

fn parse_global_quote_price(body: serde_json::Value) -> Result<Option<f64>, SourceError> {
    let response: AlphaVantageQuoteResponse = serde_json::from_value(body).map_err(|e| {
        SourceError::malformed(format!("failed to parse alphavantage global quote: {e}"))
    })?;
    Ok(response
        .quote
        .and_then(|quote| quote.get("05. price").cloned())
        .and_then(|price| numeric(Some(&price))))
}

/// Numbers arrive as strings; `"None"`, `"-"` and blanks mean absent.
fn numeric(value: Option<&str>) -> Option<f64> {
    let value = value?.trim();
    if value.is_empty() || value == "-" || value.eq_ignore_ascii_case("none") {
        return None;
    }
    value.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AlphaVantageOverview {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Sector", default)]
    sector: Option<String>,
    #[serde(rename = "PERatio", default)]
    pe_ratio: Option<String>,
    #[serde(rename = "MarketCapitalization", default)]
    market_capitalization: Option<String>,
    #[serde(rename = "DividendYield", default)]
    dividend_yield: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AlphaVantageQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    quote: Option<BTreeMap<String, String>>,
}
