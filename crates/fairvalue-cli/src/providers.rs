use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use fairvalue_core::config::ProviderConfig;
use fairvalue_core::estimators::capm::{resolve_risk_free, RiskFreeSource};
use fairvalue_core::market_data::central_bank::CentralBankRate;
use fairvalue_core::market_data::http::ReqwestHttpClient;
use fairvalue_core::market_data::yahoo::YahooFinance;
use fairvalue_core::market_data::{
    fetch_market_facts, MarketFacts, RiskFreeRateProvider, Symbol,
};
use fairvalue_core::report::{build_report, MetricsReport};
use fairvalue_core::FairValueResult;

/// Defaults, then the TOML file if given, then environment overrides.
pub fn load_config(path: Option<&Path>) -> FairValueResult<ProviderConfig> {
    let config = match path {
        Some(p) => ProviderConfig::load(p)?,
        None => ProviderConfig::default(),
    }
    .with_env_overrides();
    config.validate()?;
    debug!(
        yahoo = %config.yahoo_base_url,
        risk_free = %config.risk_free_url,
        "provider configuration loaded"
    );
    Ok(config)
}

/// Facts and metrics from one fetch action.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub facts: MarketFacts,
    pub report: MetricsReport,
}

/// Live market-data and rate providers sharing one HTTP client.
pub struct Providers {
    config: ProviderConfig,
    market: YahooFinance,
    rates: CentralBankRate,
}

impl Providers {
    pub fn from_config(config: ProviderConfig) -> FairValueResult<Self> {
        let http = Arc::new(ReqwestHttpClient::from_config(&config)?);
        let market = YahooFinance::new(http.clone(), &config);
        let rates = CentralBankRate::new(http, config.risk_free_url.clone());
        Ok(Self {
            config,
            market,
            rates,
        })
    }

    pub fn symbol(&self, ticker: &str) -> FairValueResult<Symbol> {
        Symbol::parse(ticker, &self.config.exchange_suffix)
    }

    /// The network action: market facts plus the risk-free rate.
    pub fn fetch(&self, ticker: &str) -> FairValueResult<Fetched> {
        let symbol = self.symbol(ticker)?;
        let facts = fetch_market_facts(&self.market, &symbol)?;
        let risk_free = resolve_risk_free(self.rates.latest_rate());
        let report = build_report(&facts, risk_free, self.config.dividend_yield_years);
        Ok(Fetched { facts, report })
    }
}

/// Notes worth surfacing next to any output derived from `report`.
pub fn report_warnings(report: &MetricsReport) -> Vec<String> {
    let mut warnings = Vec::new();
    if let RiskFreeSource::Fallback { reason } = &report.risk_free.source {
        warnings.push(format!(
            "Risk-free rate unavailable ({reason}); using fallback {}",
            report.risk_free.rate
        ));
    }
    if !report.beta_reported {
        warnings.push("Beta not reported by provider; using 1.0".into());
    }
    if let Some(reason) = &report.capm_unavailable {
        warnings.push(format!("CAPM unavailable: {reason}"));
    }
    if let Some(reason) = &report.insufficient_data {
        warnings.push(format!("Valuation blocked: {reason}"));
    }
    warnings
}

/// Flat view of a report for the table, CSV and minimal formats; the full
/// report rides along under `report` for JSON.
pub fn report_value(report: &MetricsReport) -> Value {
    let capm = report.capm.as_ref();
    json!({
        "result": {
            "symbol": report.symbol,
            "currency": report.currency,
            "price": report.price,
            "eps": report.eps,
            "beta": report.beta,
            "risk_free_rate": report.risk_free.rate,
            "risk_free_source": if report.risk_free.is_fallback() { "fallback" } else { "live" },
            "benchmark_return": capm.map(|c| c.benchmark_return),
            "discount_rate": capm.map(|c| c.discount_rate),
            "earnings_growth": report.earnings_growth,
            "payout_estimate": report.payout_estimate,
            "suggested_payout": report.suggested_payout,
            "dividend_yield": report.dividend_yield,
        },
        "warnings": report_warnings(report),
        "methodology": "CAPM discount rate with trailing growth, payout and yield estimates",
        "report": report,
    })
}
