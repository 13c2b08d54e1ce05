use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::FairValueError;
use crate::types::{Money, Rate};
use crate::FairValueResult;

/// (1 + rate)^periods, accumulated by repeated multiplication.
pub fn growth_factor(rate: Rate, periods: u32) -> Money {
    let step = Decimal::ONE + rate;
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor *= step;
    }
    factor
}

/// Like [`growth_factor`], but `None` once the product leaves the decimal range.
pub fn checked_growth_factor(rate: Rate, periods: u32) -> Option<Money> {
    let step = Decimal::ONE + rate;
    (0..periods).try_fold(Decimal::ONE, |factor, _| factor.checked_mul(step))
}

/// Present value of a single amount received `periods` years out.
pub fn present_value(amount: Money, rate: Rate, periods: u32) -> FairValueResult<Money> {
    if rate <= dec!(-1) {
        return Err(FairValueError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    let discount =
        checked_growth_factor(rate, periods).ok_or_else(|| FairValueError::InvalidInput {
            field: "rate".into(),
            reason: format!("Discount factor over {periods} periods exceeds decimal range"),
        })?;
    if discount.is_zero() {
        return Err(FairValueError::DivisionByZero {
            context: format!("present value discount factor at period {periods}"),
        });
    }
    amount
        .checked_div(discount)
        .ok_or_else(|| FairValueError::DivisionByZero {
            context: format!("present value at period {periods} exceeds decimal range"),
        })
}

/// Compound rate that grows `start` into `end` over `periods` periods.
///
/// Returns `None` when either endpoint is non-positive, the span is empty, or
/// the fractional power cannot be represented.
pub fn compound_rate(start: Money, end: Money, periods: u32) -> Option<Rate> {
    if start <= Decimal::ZERO || end <= Decimal::ZERO || periods == 0 {
        return None;
    }
    let ratio = end.checked_div(start)?;
    if periods == 1 {
        return Some(ratio - Decimal::ONE);
    }
    let exponent = Decimal::ONE / Decimal::from(periods);
    ratio
        .checked_powd(exponent)
        .map(|root| root - Decimal::ONE)
}
