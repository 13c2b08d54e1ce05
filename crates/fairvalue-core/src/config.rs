use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::FairValueError;
use crate::FairValueResult;

pub const ENV_YAHOO_URL: &str = "FAIRVALUE_YAHOO_URL";
pub const ENV_RISK_FREE_URL: &str = "FAIRVALUE_RISK_FREE_URL";
/// Upper bound on the dividend-yield averaging window.
pub const MAX_DIVIDEND_YIELD_YEARS: u32 = 50;

/// Endpoints and fixed choices for the market-data and rate providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL for chart and quoteSummary endpoints.
    pub yahoo_base_url: String,
    /// Page visited to obtain session cookies before requesting a crumb.
    /// `None` skips the handshake.
    pub yahoo_auth_url: Option<String>,
    /// Latest-value JSON endpoint of the policy rate series.
    pub risk_free_url: String,
    /// Index used as the market proxy for CAPM.
    pub benchmark_symbol: String,
    /// Appended to bare tickers (e.g. PETR4 -> PETR4.SA).
    pub exchange_suffix: String,
    pub timeout_ms: u64,
    pub user_agent: String,
    /// Chart range requested for the stock's own price history.
    pub price_history_range: String,
    /// Calendar years averaged by the dividend-yield estimator.
    pub dividend_yield_years: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            yahoo_base_url: "https://query1.finance.yahoo.com".into(),
            yahoo_auth_url: Some("https://fc.yahoo.com".into()),
            risk_free_url:
                "https://api.bcb.gov.br/dados/serie/bcdata.sgs.1178/dados/ultimos/1?formato=json"
                    .into(),
            benchmark_symbol: "^BVSP".into(),
            exchange_suffix: ".SA".into(),
            timeout_ms: 10_000,
            user_agent: concat!("fairvalue/", env!("CARGO_PKG_VERSION")).into(),
            price_history_range: "5y".into(),
            dividend_yield_years: 5,
        }
    }
}

impl ProviderConfig {
    pub fn from_toml_str(contents: &str) -> FairValueResult<Self> {
        let config: ProviderConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file; unspecified keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> FairValueResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FairValueError::ConfigError(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Override endpoint URLs from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_YAHOO_URL) {
            self.yahoo_base_url = url;
        }
        if let Ok(url) = std::env::var(ENV_RISK_FREE_URL) {
            self.risk_free_url = url;
        }
        self
    }

    pub fn validate(&self) -> FairValueResult<()> {
        if self.yahoo_base_url.trim().is_empty() {
            return Err(FairValueError::ConfigError("yahoo_base_url is empty".into()));
        }
        if self.risk_free_url.trim().is_empty() {
            return Err(FairValueError::ConfigError("risk_free_url is empty".into()));
        }
        if self.benchmark_symbol.trim().is_empty() {
            return Err(FairValueError::ConfigError("benchmark_symbol is empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(FairValueError::ConfigError("timeout_ms must be positive".into()));
        }
        if self.dividend_yield_years == 0 {
            return Err(FairValueError::ConfigError(
                "dividend_yield_years must be at least 1".into(),
            ));
        }
        if self.dividend_yield_years > MAX_DIVIDEND_YIELD_YEARS {
            return Err(FairValueError::ConfigError(format!(
                "dividend_yield_years must be at most {MAX_DIVIDEND_YIELD_YEARS}"
            )));
        }
        Ok(())
    }
}
