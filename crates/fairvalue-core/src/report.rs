//! Fetch-time metrics and the compute action built on them.
//!
//! A [`MetricsReport`] is derived once per fetch from [`MarketFacts`]; each
//! metric tolerates its own absence. [`evaluate`] is pure and can be re-run on
//! every parameter change without touching the network.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FairValueError;
use crate::estimators::capm::{estimate_discount_rate, CapmEstimate, RiskFreeRate};
use crate::estimators::dividend_yield::{mean_yield, yearly_dividend_yields, YearlyYield};
use crate::estimators::growth::cagr;
use crate::estimators::payout::{payout_ratio, suggested_payout, DEFAULT_PAYOUT};
use crate::market_data::MarketFacts;
use crate::types::{ComputationOutput, Money, Rate};
use crate::valuation::ddm::{calculate_ddm, DdmInput, ProjectionParameters, ValuationResult};
use crate::FairValueResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub symbol: String,
    pub currency: Option<String>,
    pub price: Option<Money>,
    pub eps: Option<Money>,
    /// Beta used for CAPM (provider value or 1.0).
    pub beta: Decimal,
    pub beta_reported: bool,
    pub risk_free: RiskFreeRate,
    pub capm: Option<CapmEstimate>,
    /// Why CAPM could not be estimated, when it could not.
    pub capm_unavailable: Option<String>,
    pub earnings_growth: Option<Rate>,
    pub payout_estimate: Option<Rate>,
    /// Payout used to seed the projection parameters.
    pub suggested_payout: Rate,
    pub dividend_yield: Option<Rate>,
    pub yearly_yields: Vec<YearlyYield>,
    /// Set when price or a positive EPS is missing; valuation is blocked.
    pub insufficient_data: Option<String>,
}

/// Run every estimator over freshly fetched facts.
pub fn build_report(
    facts: &MarketFacts,
    risk_free: RiskFreeRate,
    dividend_yield_years: u32,
) -> MetricsReport {
    let quote = &facts.quote;
    let beta = quote.beta_or_default();

    let (capm, capm_unavailable) =
        match estimate_discount_rate(risk_free.rate, beta, &facts.benchmark) {
            Ok(estimate) => (Some(estimate), None),
            Err(e) => (None, Some(e.to_string())),
        };

    let payout_estimate = payout_ratio(&facts.dividends, quote.eps, quote.shares_outstanding);
    let yearly_yields =
        yearly_dividend_yields(&facts.dividends, &facts.prices, dividend_yield_years);
    let dividend_yield = mean_yield(&yearly_yields);

    let insufficient_data = if quote.price.map_or(true, |p| p <= Decimal::ZERO) {
        Some("no current price".to_string())
    } else if quote.positive_eps().is_none() {
        Some("earnings per share missing or not positive".to_string())
    } else {
        None
    };

    MetricsReport {
        symbol: facts.symbol.to_string(),
        currency: quote.currency.clone(),
        price: quote.price,
        eps: quote.eps,
        beta,
        beta_reported: quote.beta.is_some(),
        risk_free,
        capm,
        capm_unavailable,
        earnings_growth: facts.earnings.as_ref().and_then(cagr),
        payout_estimate,
        suggested_payout: suggested_payout(payout_estimate, DEFAULT_PAYOUT),
        dividend_yield,
        yearly_yields,
        insufficient_data,
    }
}

impl MetricsReport {
    /// Default projection parameters with the payout pre-populated.
    pub fn default_parameters(&self) -> ProjectionParameters {
        ProjectionParameters {
            payout: self.suggested_payout,
            ..ProjectionParameters::default()
        }
    }

    /// The user's override if given, else the CAPM estimate.
    pub fn discount_rate(&self, override_rate: Option<Rate>) -> FairValueResult<Rate> {
        if let Some(rate) = override_rate {
            return Ok(rate);
        }
        match &self.capm {
            Some(capm) => Ok(capm.discount_rate),
            None => Err(FairValueError::InsufficientData(format!(
                "no CAPM discount rate ({}); pass an explicit discount rate",
                self.capm_unavailable.as_deref().unwrap_or("benchmark unavailable")
            ))),
        }
    }
}

/// The compute action: value the fetched facts under `params`.
pub fn evaluate(
    facts: &MarketFacts,
    report: &MetricsReport,
    params: ProjectionParameters,
    discount_override: Option<Rate>,
) -> FairValueResult<ComputationOutput<ValuationResult>> {
    let discount_rate = report.discount_rate(discount_override)?;
    let input = DdmInput::from_quote(&facts.quote, discount_rate, params)?;
    calculate_ddm(&input)
}
