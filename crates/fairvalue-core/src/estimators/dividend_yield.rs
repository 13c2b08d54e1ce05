use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DividendSeries, Money, PriceSeries, Rate};

/// Dividend yield observed in one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyYield {
    pub year: i32,
    pub dividends: Money,
    pub average_price: Money,
    pub dividend_yield: Rate,
}

/// Per-year yields over the last `years` calendar years of the price series.
///
/// A year appears only when it has both dividends and at least one positive
/// average price; other years are skipped, not zero-filled.
pub fn yearly_dividend_yields(
    dividends: &DividendSeries,
    prices: &PriceSeries,
    years: u32,
) -> Vec<YearlyYield> {
    let Some(last) = prices.closes.last() else {
        return Vec::new();
    };
    if years == 0 {
        return Vec::new();
    }
    let last_year = last.date.year();
    // Windows reaching past the calendar's start cover everything.
    let first_year = i32::try_from(years - 1)
        .ok()
        .and_then(|span| last_year.checked_sub(span))
        .unwrap_or(i32::MIN);
    let in_window = |y: i32| y >= first_year && y <= last_year;

    let mut price_totals: BTreeMap<i32, (Money, u32)> = BTreeMap::new();
    for p in prices.closes.iter().filter(|p| in_window(p.date.year())) {
        let entry = price_totals.entry(p.date.year()).or_insert((Decimal::ZERO, 0));
        entry.0 += p.value;
        entry.1 += 1;
    }

    let mut dividend_totals: BTreeMap<i32, Money> = BTreeMap::new();
    for e in dividends.events.iter().filter(|e| in_window(e.date.year())) {
        *dividend_totals.entry(e.date.year()).or_insert(Decimal::ZERO) += e.value;
    }

    dividend_totals
        .into_iter()
        .filter_map(|(year, dividends)| {
            let (total, count) = price_totals.get(&year)?;
            let average_price = *total / Decimal::from(*count);
            if average_price <= Decimal::ZERO {
                return None;
            }
            Some(YearlyYield {
                year,
                dividends,
                average_price,
                dividend_yield: dividends / average_price,
            })
        })
        .collect()
}

/// Unweighted mean of already computed yearly yields.
pub fn mean_yield(yearly: &[YearlyYield]) -> Option<Rate> {
    if yearly.is_empty() {
        return None;
    }
    let sum: Decimal = yearly.iter().map(|y| y.dividend_yield).sum();
    Some(sum / Decimal::from(yearly.len()))
}

/// Unweighted mean of the yearly yields, or `None` when no year qualifies.
pub fn average_dividend_yield(
    dividends: &DividendSeries,
    prices: &PriceSeries,
    years: u32,
) -> Option<Rate> {
    mean_yield(&yearly_dividend_yields(dividends, prices, years))
}
