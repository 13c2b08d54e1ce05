use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::FairValueError;
use crate::market_data::http::{get_text, HttpClient, HttpRequest};
use crate::market_data::RiskFreeRateProvider;
use crate::types::Rate;
use crate::FairValueResult;

/// Policy-rate series published as `[{"data": "dd/mm/yyyy", "valor": "14,90"}]`,
/// with values in percent.
pub struct CentralBankRate {
    http_client: Arc<dyn HttpClient>,
    url: String,
}

impl CentralBankRate {
    pub fn new(http_client: Arc<dyn HttpClient>, url: impl Into<String>) -> Self {
        Self {
            http_client,
            url: url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeriesPoint {
    valor: String,
}

/// Parse the most recent point of a series payload into a fraction.
pub fn parse_series_rate(body: &str) -> FairValueResult<Rate> {
    let points: Vec<SeriesPoint> = serde_json::from_str(body)?;
    let latest = points
        .last()
        .ok_or_else(|| FairValueError::DataUnavailable("rate series is empty".into()))?;
    let normalised = latest.valor.trim().replace(',', ".");
    let percent = Decimal::from_str(&normalised).map_err(|e| {
        FairValueError::SerializationError(format!("rate value '{}': {e}", latest.valor))
    })?;
    Ok(percent / dec!(100))
}

impl RiskFreeRateProvider for CentralBankRate {
    fn latest_rate(&self) -> FairValueResult<Rate> {
        let body = get_text(
            self.http_client.as_ref(),
            HttpRequest::get(&self.url).with_header("accept", "application/json"),
        )?;
        parse_series_rate(&body)
    }
}
