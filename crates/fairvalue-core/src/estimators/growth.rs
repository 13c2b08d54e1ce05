use crate::time_value::compound_rate;
use crate::types::{EarningsSeries, Rate};

/// Compound growth rate of net income between the earliest and latest usable
/// periods.
///
/// The period count is the index distance between the two endpoints, so gaps
/// inside the series do not shorten the span. Returns `None` when fewer than
/// two usable points exist or either endpoint is non-positive.
pub fn cagr(series: &EarningsSeries) -> Option<Rate> {
    let mut usable = series
        .periods
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.net_income.map(|v| (i, v)));

    let (first_idx, first) = usable.next()?;
    let (last_idx, last) = usable.last()?;
    let periods = u32::try_from(last_idx - first_idx).ok()?;
    compound_rate(first, last, periods)
}
