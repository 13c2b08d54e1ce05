use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::FairValueError;
use crate::market_data::http::{get_text, HttpClient, HttpRequest};
use crate::market_data::{MarketDataProvider, PriceHistory, Symbol};
use crate::types::{
    BenchmarkSeries, DividendSeries, EarningsPeriod, EarningsSeries, Observation, PriceSeries,
    QuoteSnapshot,
};
use crate::FairValueResult;

const REFERER: &str = "https://finance.yahoo.com/";
const BENCHMARK_RANGE: &str = "1y";
const QUOTE_MODULES: &str = "price,summaryDetail,defaultKeyStatistics";
const EARNINGS_MODULES: &str = "incomeStatementHistory";

/// Yahoo Finance chart + quoteSummary adapter.
///
/// The quoteSummary endpoint wants a session cookie and crumb. The handshake
/// runs at most once per adapter; if it fails requests go out without a crumb
/// and the endpoint decides.
pub struct YahooFinance {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    auth_url: Option<String>,
    benchmark_symbol: String,
    history_range: String,
    crumb: OnceLock<Option<String>>,
}

impl YahooFinance {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &ProviderConfig) -> Self {
        Self {
            http_client,
            base_url: config.yahoo_base_url.trim_end_matches('/').to_string(),
            auth_url: config.yahoo_auth_url.clone(),
            benchmark_symbol: config.benchmark_symbol.clone(),
            history_range: config.price_history_range.clone(),
            crumb: OnceLock::new(),
        }
    }

    fn crumb(&self) -> Option<&str> {
        self.crumb.get_or_init(|| self.fetch_crumb()).as_deref()
    }

    fn fetch_crumb(&self) -> Option<String> {
        let auth_url = self.auth_url.as_ref()?;
        // Only the cookies matter here; the page itself usually 404s.
        if let Err(e) = self
            .http_client
            .execute(HttpRequest::get(auth_url).with_header("referer", REFERER))
        {
            debug!(error = %e, "yahoo cookie request failed");
        }
        let request = HttpRequest::get(format!("{}/v1/test/getcrumb", self.base_url))
            .with_header("referer", REFERER);
        match get_text(self.http_client.as_ref(), request) {
            Ok(body) => {
                let crumb = body.trim();
                if crumb.is_empty() || crumb.contains('<') || crumb.contains(char::is_whitespace) {
                    warn!("yahoo returned an unusable crumb, continuing without one");
                    None
                } else {
                    Some(crumb.to_string())
                }
            }
            Err(e) => {
                warn!(error = %e, "yahoo crumb unavailable, continuing without one");
                None
            }
        }
    }

    fn chart(&self, symbol: &str, range: &str) -> FairValueResult<ChartData> {
        let endpoint = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d&events=div",
            self.base_url,
            urlencoding::encode(symbol),
            urlencoding::encode(range),
        );
        let body = get_text(
            self.http_client.as_ref(),
            HttpRequest::get(endpoint).with_header("referer", REFERER),
        )?;
        parse_chart(symbol, &body)
    }

    fn quote_summary(&self, symbol: &str, modules: &str) -> FairValueResult<SummaryData> {
        let mut endpoint = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}",
            self.base_url,
            urlencoding::encode(symbol),
            urlencoding::encode(modules),
        );
        if let Some(crumb) = self.crumb() {
            endpoint.push_str("&crumb=");
            endpoint.push_str(&urlencoding::encode(crumb));
        }
        let body = get_text(
            self.http_client.as_ref(),
            HttpRequest::get(endpoint).with_header("referer", REFERER),
        )?;
        parse_quote_summary(symbol, &body)
    }
}

impl MarketDataProvider for YahooFinance {
    fn quote(&self, symbol: &Symbol) -> FairValueResult<QuoteSnapshot> {
        Ok(self.quote_summary(symbol.as_str(), QUOTE_MODULES)?.quote)
    }

    fn history(&self, symbol: &Symbol) -> FairValueResult<PriceHistory> {
        let chart = self.chart(symbol.as_str(), &self.history_range)?;
        Ok(PriceHistory {
            prices: PriceSeries::new(chart.closes),
            dividends: DividendSeries::new(chart.dividends),
        })
    }

    fn earnings(&self, symbol: &Symbol) -> FairValueResult<Option<EarningsSeries>> {
        Ok(self.quote_summary(symbol.as_str(), EARNINGS_MODULES)?.earnings)
    }

    fn benchmark(&self) -> FairValueResult<BenchmarkSeries> {
        let chart = self.chart(&self.benchmark_symbol, BENCHMARK_RANGE)?;
        Ok(BenchmarkSeries::new(self.benchmark_symbol.clone(), chart.closes))
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub closes: Vec<Observation>,
    pub dividends: Vec<Observation>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryData {
    pub quote: QuoteSnapshot,
    pub earnings: Option<EarningsSeries>,
}

fn to_decimal(value: f64) -> Option<Decimal> {
    if value.is_finite() {
        Decimal::from_f64(value)
    } else {
        None
    }
}

fn to_date(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

fn api_error(symbol: &str, error: Option<YahooApiError>) -> FairValueError {
    match error {
        Some(e) => FairValueError::DataUnavailable(format!(
            "{symbol}: {} ({})",
            e.description.unwrap_or_default(),
            e.code.unwrap_or_default()
        )),
        None => FairValueError::DataUnavailable(format!("{symbol}: no data returned")),
    }
}

/// Parse a chart payload into daily closes and dividend events.
///
/// Days without a close are dropped.
pub fn parse_chart(symbol: &str, body: &str) -> FairValueResult<ChartData> {
    let response: YahooChartResponse = serde_json::from_str(body).map_err(|e| {
        FairValueError::DataUnavailable(format!("{symbol}: malformed chart response: {e}"))
    })?;
    let envelope = response.chart;
    let result = match envelope.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result,
        None => return Err(api_error(symbol, envelope.error)),
    };

    let closes_raw = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let closes = result
        .timestamp
        .iter()
        .zip(closes_raw.iter())
        .filter_map(|(ts, close)| {
            let value = to_decimal((*close)?)?;
            Some(Observation::new(to_date(*ts)?, value))
        })
        .collect();

    let dividends = result
        .events
        .map(|e| e.dividends)
        .unwrap_or_default()
        .into_values()
        .filter_map(|d| Some(Observation::new(to_date(d.date)?, to_decimal(d.amount)?)))
        .collect();

    Ok(ChartData {
        closes,
        dividends,
        currency: result.meta.and_then(|m| m.currency),
    })
}

/// Parse a quoteSummary payload. Missing modules leave fields `None`.
pub fn parse_quote_summary(symbol: &str, body: &str) -> FairValueResult<SummaryData> {
    let response: YahooQuoteSummaryResponse = serde_json::from_str(body).map_err(|e| {
        FairValueError::DataUnavailable(format!("{symbol}: malformed quoteSummary response: {e}"))
    })?;
    let envelope = response.quote_summary;
    let result = match envelope.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result,
        None => return Err(api_error(symbol, envelope.error)),
    };

    let stats = result.default_key_statistics.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let price = result.price.unwrap_or_default();

    let quote = QuoteSnapshot {
        price: YahooRawValue::decimal(&price.regular_market_price),
        eps: YahooRawValue::decimal(&stats.trailing_eps),
        beta: YahooRawValue::decimal(&stats.beta).or_else(|| YahooRawValue::decimal(&detail.beta)),
        shares_outstanding: YahooRawValue::decimal(&stats.shares_outstanding),
        currency: price.currency,
    };

    let earnings = result.income_statement_history.and_then(|h| {
        let periods: Vec<EarningsPeriod> = h
            .statements
            .iter()
            .filter_map(|s| {
                let end = s.end_date.as_ref()?.raw?;
                Some(EarningsPeriod {
                    period_end: to_date(end as i64)?,
                    net_income: YahooRawValue::decimal(&s.net_income),
                })
            })
            .collect();
        if periods.is_empty() {
            None
        } else {
            Some(EarningsSeries::new(periods))
        }
    });

    Ok(SummaryData { quote, earnings })
}

// ---------------------------------------------------------------------------
// Yahoo Finance API response structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct YahooApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartEnvelope {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    events: Option<YahooChartEvents>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartEvents {
    #[serde(default)]
    dividends: BTreeMap<String, YahooDividendEvent>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooDividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: YahooQuoteSummaryEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteSummaryEnvelope {
    #[serde(default)]
    result: Option<Vec<YahooQuoteSummaryResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteSummaryResult {
    #[serde(rename = "defaultKeyStatistics", default)]
    default_key_statistics: Option<YahooDefaultKeyStatistics>,
    #[serde(rename = "summaryDetail", default)]
    summary_detail: Option<YahooSummaryDetail>,
    #[serde(default)]
    price: Option<YahooPriceModule>,
    #[serde(rename = "incomeStatementHistory", default)]
    income_statement_history: Option<YahooIncomeStatementHistory>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooDefaultKeyStatistics {
    #[serde(rename = "trailingEps", default)]
    trailing_eps: Option<YahooRawValue>,
    #[serde(default)]
    beta: Option<YahooRawValue>,
    #[serde(rename = "sharesOutstanding", default)]
    shares_outstanding: Option<YahooRawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooSummaryDetail {
    #[serde(default)]
    beta: Option<YahooRawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooPriceModule {
    #[serde(rename = "regularMarketPrice", default)]
    regular_market_price: Option<YahooRawValue>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooIncomeStatementHistory {
    #[serde(rename = "incomeStatementHistory", default)]
    statements: Vec<YahooIncomeStatement>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooIncomeStatement {
    #[serde(rename = "endDate", default)]
    end_date: Option<YahooRawValue>,
    #[serde(rename = "netIncome", default)]
    net_income: Option<YahooRawValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`; missing values
/// arrive as `{}`.
#[derive(Debug, Clone, Deserialize)]
struct YahooRawValue {
    #[serde(default)]
    raw: Option<f64>,
}

impl YahooRawValue {
    fn decimal(value: &Option<YahooRawValue>) -> Option<Decimal> {
        value.as_ref().and_then(|v| v.raw).and_then(to_decimal)
    }
}
