use chrono::Months;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{DividendSeries, Money, Rate};

/// Payout used to seed the projection parameters when no estimate exists.
pub const DEFAULT_PAYOUT: Rate = dec!(0.4);

/// Sum of dividend events in the twelve months ending at the latest event.
///
/// Events strictly after `latest - 12 months` are included.
pub fn trailing_twelve_month_dividends(dividends: &DividendSeries) -> Option<Money> {
    let latest = dividends.events.last()?.date;
    let cutoff = latest.checked_sub_months(Months::new(12))?;
    Some(
        dividends
            .events
            .iter()
            .filter(|e| e.date > cutoff)
            .map(|e| e.value)
            .sum(),
    )
}

/// TTM dividends over total earnings (EPS × shares outstanding).
///
/// Undefined when there are no dividends, EPS or share count is missing, or
/// total earnings are not positive.
pub fn payout_ratio(
    dividends: &DividendSeries,
    eps: Option<Money>,
    shares_outstanding: Option<Decimal>,
) -> Option<Rate> {
    let ttm = trailing_twelve_month_dividends(dividends)?;
    let total_earnings = eps? * shares_outstanding?;
    if total_earnings <= Decimal::ZERO {
        return None;
    }
    Some(ttm / total_earnings)
}

/// Payout to pre-populate the projection parameters with: the estimate
/// clamped to [0, 1], or `default` when there is none.
pub fn suggested_payout(estimate: Option<Rate>, default: Rate) -> Rate {
    match estimate {
        Some(p) => p.clamp(Decimal::ZERO, Decimal::ONE),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Observation;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dividends() -> DividendSeries {
        DividendSeries::new(vec![
            Observation::new(d(2024, 8, 1), dec!(0.90)),
            Observation::new(d(2025, 3, 1), dec!(0.50)),
            Observation::new(d(2025, 9, 1), dec!(0.60)),
            Observation::new(d(2026, 3, 1), dec!(0.70)),
        ])
    }

    #[test]
    fn test_ttm_anchored_on_latest_event() {
        // cutoff 2025-03-01 is excluded
        assert_eq!(
            trailing_twelve_month_dividends(&dividends()),
            Some(dec!(1.30))
        );
    }

    #[test]
    fn test_ttm_empty_series() {
        assert_eq!(trailing_twelve_month_dividends(&DividendSeries::default()), None);
    }

    #[test]
    fn test_payout_ratio() {
        // 1.30 / (2.60 * 1) = 0.5
        let p = payout_ratio(&dividends(), Some(dec!(2.60)), Some(dec!(1)));
        assert_eq!(p, Some(dec!(0.5)));
    }

    #[test]
    fn test_payout_uses_total_earnings() {
        // per-share dividends against total earnings, as observed upstream
        let p = payout_ratio(&dividends(), Some(dec!(1.30)), Some(dec!(1000)));
        assert_eq!(p, Some(dec!(0.001)));
    }

    #[test]
    fn test_payout_undefined_for_non_positive_earnings() {
        assert_eq!(payout_ratio(&dividends(), Some(dec!(-1)), Some(dec!(100))), None);
        assert_eq!(payout_ratio(&dividends(), Some(dec!(0)), Some(dec!(100))), None);
    }

    #[test]
    fn test_payout_undefined_for_missing_inputs() {
        assert_eq!(payout_ratio(&dividends(), None, Some(dec!(100))), None);
        assert_eq!(payout_ratio(&dividends(), Some(dec!(2)), None), None);
        assert_eq!(
            payout_ratio(&DividendSeries::default(), Some(dec!(2)), Some(dec!(1))),
            None
        );
    }

    #[test]
    fn test_suggested_payout_defaults_and_clamps() {
        assert_eq!(suggested_payout(None, DEFAULT_PAYOUT), dec!(0.4));
        assert_eq!(suggested_payout(Some(dec!(0.35)), DEFAULT_PAYOUT), dec!(0.35));
        assert_eq!(suggested_payout(Some(dec!(1.7)), DEFAULT_PAYOUT), Decimal::ONE);
        assert_eq!(suggested_payout(Some(dec!(-0.2)), DEFAULT_PAYOUT), Decimal::ZERO);
    }

    #[test]
    fn test_suggested_payout_uses_caller_default() {
        assert_eq!(suggested_payout(None, dec!(0.25)), dec!(0.25));
        assert_eq!(suggested_payout(Some(dec!(0.6)), dec!(0.25)), dec!(0.6));
    }
}
