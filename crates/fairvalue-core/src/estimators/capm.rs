use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::estimators::benchmark::trailing_return;
use crate::types::{BenchmarkSeries, Rate};
use crate::FairValueResult;

/// Risk-free rate substituted whenever the rate provider fails.
pub const FALLBACK_RISK_FREE_RATE: Rate = dec!(0.105);

/// Where a risk-free rate came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskFreeSource {
    Live,
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFreeRate {
    pub rate: Rate,
    pub source: RiskFreeSource,
}

impl RiskFreeRate {
    pub fn live(rate: Rate) -> Self {
        Self {
            rate,
            source: RiskFreeSource::Live,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, RiskFreeSource::Fallback { .. })
    }
}

/// Apply the fallback policy to a rate provider outcome.
///
/// Any failure yields [`FALLBACK_RISK_FREE_RATE`] tagged with the reason; the
/// error itself is never propagated.
pub fn resolve_risk_free(outcome: FairValueResult<Rate>) -> RiskFreeRate {
    match outcome {
        Ok(rate) => RiskFreeRate::live(rate),
        Err(e) => {
            warn!(
                fallback = %FALLBACK_RISK_FREE_RATE,
                error = %e,
                "risk-free rate unavailable, using fallback"
            );
            RiskFreeRate {
                rate: FALLBACK_RISK_FREE_RATE,
                source: RiskFreeSource::Fallback {
                    reason: e.to_string(),
                },
            }
        }
    }
}

/// CAPM required return: Rf + Beta * (Rm - Rf)
pub fn capm_rate(risk_free: Rate, beta: Decimal, benchmark_return: Rate) -> Rate {
    risk_free + beta * (benchmark_return - risk_free)
}

/// CAPM estimate with its inputs echoed back for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapmEstimate {
    pub discount_rate: Rate,
    pub risk_free_rate: Rate,
    pub beta: Decimal,
    pub benchmark_return: Rate,
    /// Rm - Rf
    pub market_premium: Rate,
}

/// Discount rate implied by CAPM against a benchmark's trailing return.
pub fn estimate_discount_rate(
    risk_free: Rate,
    beta: Decimal,
    benchmark: &BenchmarkSeries,
) -> FairValueResult<CapmEstimate> {
    let benchmark_return = trailing_return(benchmark)?;
    Ok(CapmEstimate {
        discount_rate: capm_rate(risk_free, beta, benchmark_return),
        risk_free_rate: risk_free,
        beta,
        benchmark_return,
        market_premium: benchmark_return - risk_free,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FairValueError;
    use crate::types::Observation;
    use chrono::NaiveDate;

    fn benchmark(first: Decimal, last: Decimal) -> BenchmarkSeries {
        BenchmarkSeries::new(
            "^BVSP",
            vec![
                Observation::new(NaiveDate::from_ymd_opt(2025, 10, 17).unwrap(), first),
                Observation::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(), last),
            ],
        )
    }

    #[test]
    fn test_capm_rate_formula() {
        // 0.10 + 1.2 * (0.15 - 0.10) = 0.16
        assert_eq!(capm_rate(dec!(0.10), dec!(1.2), dec!(0.15)), dec!(0.16));
    }

    #[test]
    fn test_capm_beta_zero_is_risk_free() {
        assert_eq!(capm_rate(dec!(0.105), dec!(0), dec!(0.30)), dec!(0.105));
    }

    #[test]
    fn test_capm_beta_one_is_market_return() {
        assert_eq!(capm_rate(dec!(0.105), dec!(1), dec!(0.18)), dec!(0.18));
    }

    #[test]
    fn test_estimate_uses_benchmark_return() {
        let est = estimate_discount_rate(dec!(0.10), dec!(0.8), &benchmark(dec!(100), dec!(120)))
            .unwrap();
        assert_eq!(est.benchmark_return, dec!(0.2));
        assert_eq!(est.market_premium, dec!(0.1));
        // 0.10 + 0.8 * 0.10 = 0.18
        assert_eq!(est.discount_rate, dec!(0.18));
    }

    #[test]
    fn test_estimate_requires_two_points() {
        let short = BenchmarkSeries::new(
            "^BVSP",
            vec![Observation::new(
                NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
                dec!(100),
            )],
        );
        assert!(matches!(
            estimate_discount_rate(dec!(0.1), dec!(1), &short),
            Err(FairValueError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_resolve_live_rate() {
        let r = resolve_risk_free(Ok(dec!(0.149)));
        assert_eq!(r.rate, dec!(0.149));
        assert!(!r.is_fallback());
    }

    #[test]
    fn test_resolve_failure_substitutes_fallback() {
        let r = resolve_risk_free(Err(FairValueError::DataUnavailable(
            "connection refused".into(),
        )));
        assert_eq!(r.rate, dec!(0.105));
        assert!(r.is_fallback());
        match r.source {
            RiskFreeSource::Fallback { reason } => assert!(reason.contains("connection refused")),
            RiskFreeSource::Live => panic!("expected fallback"),
        }
    }

    #[test]
    fn test_fallback_flows_into_capm() {
        let r = resolve_risk_free(Err(FairValueError::SerializationError("bad json".into())));
        let est = estimate_discount_rate(r.rate, dec!(1.5), &benchmark(dec!(100), dec!(110)))
            .unwrap();
        assert_eq!(est.risk_free_rate, dec!(0.105));
        // 0.105 + 1.5 * (0.10 - 0.105) = 0.0975
        assert_eq!(est.discount_rate, dec!(0.0975));
    }
}
