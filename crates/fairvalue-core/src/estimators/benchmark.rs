use rust_decimal::Decimal;

use crate::error::FairValueError;
use crate::types::{BenchmarkSeries, Rate};
use crate::FairValueResult;

/// Simple trailing return of the benchmark: `last / first - 1`.
pub fn trailing_return(series: &BenchmarkSeries) -> FairValueResult<Rate> {
    if series.levels.len() < 2 {
        return Err(FairValueError::InsufficientData(format!(
            "benchmark {} needs at least 2 observations, got {}",
            series.symbol,
            series.levels.len()
        )));
    }
    let first = series.levels[0].value;
    let last = series.levels[series.levels.len() - 1].value;
    if first <= Decimal::ZERO {
        return Err(FairValueError::InsufficientData(format!(
            "benchmark {} starts at non-positive level {first}",
            series.symbol
        )));
    }
    Ok(last / first - Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Observation;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn series(levels: &[Decimal]) -> BenchmarkSeries {
        let start = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        BenchmarkSeries::new(
            "^BVSP",
            levels
                .iter()
                .enumerate()
                .map(|(i, v)| Observation::new(start + chrono::Days::new(i as u64), *v))
                .collect(),
        )
    }

    #[test]
    fn test_trailing_return_uses_endpoints_only() {
        let s = series(&[dec!(100000), dec!(90000), dec!(125000), dec!(120000)]);
        assert_eq!(trailing_return(&s).unwrap(), dec!(0.2));
    }

    #[test]
    fn test_trailing_return_negative() {
        let s = series(&[dec!(200), dec!(150)]);
        assert_eq!(trailing_return(&s).unwrap(), dec!(-0.25));
    }

    #[test]
    fn test_single_observation_is_insufficient() {
        let s = series(&[dec!(100)]);
        assert!(matches!(
            trailing_return(&s),
            Err(FairValueError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_empty_is_insufficient() {
        let s = series(&[]);
        assert!(trailing_return(&s).is_err());
    }

    #[test]
    fn test_zero_first_level_is_insufficient() {
        let s = series(&[dec!(0), dec!(100)]);
        assert!(trailing_return(&s).is_err());
    }
}
