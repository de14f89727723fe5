use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::data_source::{DataSource, FetchFuture, SourceError};
use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, DEFAULT_TIMEOUT_MS};
use crate::{FinancialRecord, SourceId, Ticker};

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str = "price,summaryProfile,summaryDetail,defaultKeyStatistics";
const REFERER: &str = "https://finance.yahoo.com/";
const CRUMB_TTL: Duration = Duration::from_secs(3_600);

// ============================================================================
// Session handshake
// ============================================================================

#[derive(Debug, Clone)]
struct Crumb {
    value: String,
    fetched_at: Instant,
}

/// Cookie + crumb session required by Yahoo's unofficial endpoints.
///
/// Cookies live in the transport's jar; only the crumb is cached here.
#[derive(Debug, Default)]
struct YahooSession {
    crumb: Mutex<Option<Crumb>>,
}

impl YahooSession {
    async fn crumb(
        &self,
        http_client: &dyn HttpClient,
        timeout_ms: u64,
    ) -> Result<String, SourceError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            if crumb.fetched_at.elapsed() < CRUMB_TTL {
                return Ok(crumb.value.clone());
            }
        }

        let value = handshake(http_client, timeout_ms).await?;
        *cached = Some(Crumb {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    async fn invalidate(&self) {
        *self.crumb.lock().await = None;
    }
}

async fn handshake(http_client: &dyn HttpClient, timeout_ms: u64) -> Result<String, SourceError> {
    // The cookie endpoint usually answers 404 but still sets the session cookie.
    let cookie_request = HttpRequest::get(COOKIE_URL)
        .with_header("referer", REFERER)
        .with_timeout_ms(timeout_ms);
    http_client
        .execute(cookie_request)
        .await
        .map_err(|error| transport_error("cookie handshake", &error, timeout_ms))?;

    for url in CRUMB_URLS {
        let request = HttpRequest::get(url)
            .with_header("referer", REFERER)
            .with_timeout_ms(timeout_ms);

        let response = match http_client.execute(request).await {
            Ok(response) => response,
            Err(error) => {
                log::debug!("yahoo crumb endpoint {url} failed: {error}");
                continue;
            }
        };

        if response.status == 429 {
            return Err(SourceError::rate_limited("yahoo rate limited the crumb handshake"));
        }

        let body = response.body.trim();
        let looks_like_crumb = response.is_success()
            && !body.is_empty()
            && body.len() < 100
            && !body.contains(' ')
            && !body.contains('<');
        if looks_like_crumb {
            return Ok(body.to_owned());
        }
    }

    Err(SourceError::unavailable("failed to obtain yahoo crumb from all endpoints"))
}

// ============================================================================
// Yahoo Adapter
// ============================================================================

/// Live Yahoo Finance source backed by the quote-summary endpoint.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    session: Arc<YahooSession>,
    timeout_ms: u64,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            session: Arc::new(YahooSession::default()),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    async fn fetch_summary(&self, ticker: &Ticker) -> Result<String, SourceError> {
        let crumb = self
            .session
            .crumb(self.http_client.as_ref(), self.timeout_ms)
            .await?;
        let response = self.request_summary(ticker, &crumb).await?;

        // An expired crumb shows up as 401 or 429; redo the handshake once.
        let response = if matches!(response.status, 401 | 429) {
            self.session.invalidate().await;
            let crumb = self
                .session
                .crumb(self.http_client.as_ref(), self.timeout_ms)
                .await?;
            self.request_summary(ticker, &crumb).await?
        } else {
            response
        };

        match response.status {
            status if (200..300).contains(&status) => Ok(response.body),
            404 => Err(SourceError::not_found(ticker)),
            429 => Err(SourceError::rate_limited("yahoo returned status 429")),
            status => Err(SourceError::unavailable(format!(
                "yahoo returned status {status}"
            ))),
        }
    }

    async fn request_summary(
        &self,
        ticker: &Ticker,
        crumb: &str,
    ) -> Result<HttpResponse, SourceError> {
        let request = HttpRequest::get(format!(
            "{QUOTE_SUMMARY_URL}/{}",
            urlencoding::encode(ticker.as_str())
        ))
        .with_query("modules", SUMMARY_MODULES)
        .with_query("crumb", crumb)
        .with_header("referer", REFERER)
        .with_timeout_ms(self.timeout_ms);

        log::debug!("yahoo GET {}", request.redacted_url());
        self.http_client
            .execute(request)
            .await
            .map_err(|error| transport_error("quote summary", &error, self.timeout_ms))
    }
}

impl DataSource for YahooAdapter {
    fn id(&self) -> SourceId {
        SourceId::Yahoo
    }

    fn fetch<'a>(&'a self, ticker: &'a Ticker) -> FetchFuture<'a> {
        Box::pin(async move {
            let body = self.fetch_summary(ticker).await?;
            parse_quote_summary(ticker, &body)
        })
    }
}

/// Normalizes a quote-summary payload into a record.
fn parse_quote_summary(ticker: &Ticker, body: &str) -> Result<FinancialRecord, SourceError> {
    let response: YahooQuoteSummaryResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo response: {e}")))?;

    if let Some(error) = response.quote_summary.error.filter(|e| !e.is_null()) {
        let code = error
            .get("code")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        if code.eq_ignore_ascii_case("not found") {
            return Err(SourceError::not_found(ticker));
        }
        return Err(SourceError::unavailable(format!("yahoo API error: {error}")));
    }

    let result = response
        .quote_summary
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::not_found(ticker))?;

    let price = result.price.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let stats = result.default_key_statistics.unwrap_or_default();

    let record = FinancialRecord::new(ticker.clone(), SourceId::Yahoo)
        .with_company_name(price.long_name.or(price.short_name))
        .with_price(raw(&price.regular_market_price))
        .with_sector(result.summary_profile.and_then(|profile| profile.sector))
        .with_pe_ratio(raw(&detail.trailing_pe).or_else(|| raw(&stats.forward_pe)))
        .with_market_cap(raw(&price.market_cap).or_else(|| raw(&detail.market_cap)))
        .with_dividend_yield(raw(&detail.dividend_yield));

    if record.is_empty() {
        return Err(SourceError::missing_fields(
            "yahoo response has neither a price nor a company name",
        ));
    }
    record
        .validate()
        .map_err(|e| SourceError::malformed(format!("yahoo returned invalid values: {e}")))?;

    Ok(record)
}

fn transport_error(stage: &str, error: &HttpError, timeout_ms: u64) -> SourceError {
    if error.timed_out() {
        SourceError::timeout(timeout_ms)
    } else {
        SourceError::unavailable(format!("yahoo {stage} transport error: {}", error.message()))
    }
}

fn raw(value: &Option<YahooRawValue>) -> Option<f64> {
    value
        .as_ref()
        .and_then(|value| value.raw.as_ref())
        .and_then(serde_json::Value::as_f64)
        .filter(|value| value.is_finite())
}

// ============================================================================
// Yahoo quote-summary response structures
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: YahooQuoteSummaryData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteSummaryData {
    #[serde(default)]
    result: Option<Vec<YahooQuoteSummaryResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteSummaryResult {
    #[serde(default)]
    price: Option<YahooPriceModule>,
    #[serde(rename = "summaryProfile", default)]
    summary_profile: Option<YahooSummaryProfile>,
    #[serde(rename = "summaryDetail", default)]
    summary_detail: Option<YahooSummaryDetail>,
    #[serde(rename = "defaultKeyStatistics", default)]
    default_key_statistics: Option<YahooKeyStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooPriceModule {
    #[serde(rename = "regularMarketPrice", default)]
    regular_market_price: Option<YahooRawValue>,
    #[serde(rename = "marketCap", default)]
    market_cap: Option<YahooRawValue>,
    #[serde(rename = "longName", default)]
    long_name: Option<String>,
    #[serde(rename = "shortName", default)]
    short_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooSummaryProfile {
    #[serde(default)]
    sector: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooSummaryDetail {
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<YahooRawValue>,
    #[serde(rename = "marketCap", default)]
    market_cap: Option<YahooRawValue>,
    #[serde(rename = "dividendYield", default)]
    dividend_yield: Option<YahooRawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooKeyStatistics {
    #[serde(rename = "forwardPE", default)]
    forward_pe: Option<YahooRawValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`; `raw` is
/// occasionally a string such as `"Infinity"`, which is treated as absent.
#[derive(Debug, Clone, Deserialize)]
struct YahooRawValue {
    #[serde(default)]
    raw: Option<serde_json::Value>,
}
