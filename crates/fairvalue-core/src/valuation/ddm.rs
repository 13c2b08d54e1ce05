//! Two-stage Dividend Discount Model with margin of safety.
//!
//! Stage one projects the current payout-derived dividend for an explicit
//! horizon and discounts it year by year. Stage two is a perpetuity-growth
//! terminal value anchored on the dividend one year past the horizon.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FairValueError;
use crate::time_value::{growth_factor, present_value};
use crate::types::{with_metadata, ComputationOutput, Money, QuoteSnapshot, Rate};
use crate::FairValueResult;

pub const MAX_GROWTH: Rate = dec!(0.30);
pub const MAX_HORIZON_YEARS: u32 = 20;
pub const MAX_MARGIN_OF_SAFETY: Rate = dec!(0.5);

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// User-tunable projection assumptions. Omitted fields take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionParameters {
    /// Annual dividend growth during the explicit horizon and beyond.
    pub growth: Rate,
    /// Fraction of EPS paid out as dividends.
    pub payout: Rate,
    /// Explicit projection horizon in whole years.
    pub horizon_years: u32,
    /// Haircut applied to the fair value.
    pub margin_of_safety: Rate,
}

impl Default for ProjectionParameters {
    fn default() -> Self {
        Self {
            growth: dec!(0.10),
            payout: dec!(0.4),
            horizon_years: 10,
            margin_of_safety: dec!(0.10),
        }
    }
}

impl ProjectionParameters {
    pub fn validate(&self) -> FairValueResult<()> {
        if self.growth < Decimal::ZERO || self.growth > MAX_GROWTH {
            return Err(FairValueError::InvalidInput {
                field: "growth".into(),
                reason: format!("Growth must be between 0 and {MAX_GROWTH}"),
            });
        }
        if self.payout < Decimal::ZERO || self.payout > Decimal::ONE {
            return Err(FairValueError::InvalidInput {
                field: "payout".into(),
                reason: "Payout ratio must be between 0 and 1".into(),
            });
        }
        if self.horizon_years == 0 || self.horizon_years > MAX_HORIZON_YEARS {
            return Err(FairValueError::InvalidInput {
                field: "horizon_years".into(),
                reason: format!("Horizon must be between 1 and {MAX_HORIZON_YEARS} years"),
            });
        }
        if self.margin_of_safety < Decimal::ZERO || self.margin_of_safety > MAX_MARGIN_OF_SAFETY
        {
            return Err(FairValueError::InvalidInput {
                field: "margin_of_safety".into(),
                reason: format!("Margin of safety must be between 0 and {MAX_MARGIN_OF_SAFETY}"),
            });
        }
        Ok(())
    }
}

/// Input for the two-stage DDM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdmInput {
    /// Current share price.
    pub price: Money,
    /// Trailing twelve-month earnings per share.
    pub eps: Money,
    /// Required return (CAPM estimate or user override).
    pub discount_rate: Rate,
    #[serde(flatten)]
    pub params: ProjectionParameters,
}

impl DdmInput {
    /// Build an input from quote facts, short-circuiting when price or a
    /// positive EPS is missing.
    pub fn from_quote(
        quote: &QuoteSnapshot,
        discount_rate: Rate,
        params: ProjectionParameters,
    ) -> FairValueResult<Self> {
        let price = quote
            .price
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| FairValueError::InsufficientData("no current price".into()))?;
        let eps = quote.positive_eps().ok_or_else(|| {
            FairValueError::InsufficientData(match quote.eps {
                None => "earnings per share unavailable".into(),
                Some(e) => format!("earnings per share is not positive ({e})"),
            })
        })?;
        Ok(Self {
            price,
            eps,
            discount_rate,
            params,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Upside,
    Downside,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Upside => f.write_str("Upside"),
            Classification::Downside => f.write_str("Downside"),
        }
    }
}

/// Strictly positive upside is `Upside`; zero counts as `Downside`.
pub fn classify(upside: Money) -> Classification {
    if upside > Decimal::ZERO {
        Classification::Upside
    } else {
        Classification::Downside
    }
}

/// Year-by-year dividend detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearDetail {
    /// Year number (1-indexed).
    pub year: u32,
    /// Projected dividend for this year.
    pub dividend: Money,
    /// Present value of this year's dividend.
    pub pv: Money,
}

/// Output of the two-stage DDM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// EPS × payout.
    pub initial_dividend: Money,
    /// Sum of discounted dividends over the explicit horizon.
    pub stage_one_pv: Money,
    /// Dividend one year past the horizon.
    pub terminal_dividend: Money,
    /// Perpetuity value at the horizon (undiscounted).
    pub terminal_value: Money,
    pub terminal_value_pv: Money,
    /// Terminal PV as a percentage of fair value.
    pub terminal_pct: Decimal,
    /// Fair value before the margin of safety.
    pub fair_value: Money,
    /// Fair value after the margin of safety.
    pub adjusted_fair_value: Money,
    pub price: Money,
    /// adjusted_fair_value - price
    pub upside: Money,
    /// adjusted_fair_value / price - 1
    pub upside_pct: Rate,
    pub classification: Classification,
    pub year_by_year: Vec<YearDetail>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Calculate the two-stage DDM fair value and compare it against price.
pub fn calculate_ddm(input: &DdmInput) -> FairValueResult<ComputationOutput<ValuationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let ProjectionParameters {
        growth: g,
        payout,
        horizon_years,
        margin_of_safety,
    } = input.params;
    let r = input.discount_rate;

    let initial_dividend = checked(input.eps.checked_mul(payout), "initial dividend")?;

    // --- Stage one: explicit horizon ---
    let mut year_by_year = Vec::with_capacity(horizon_years as usize);
    let mut stage_one_pv = Decimal::ZERO;
    for t in 1..=horizon_years {
        let dividend = checked(
            initial_dividend.checked_mul(growth_factor(g, t)),
            "projected dividend",
        )?;
        let pv = present_value(dividend, r, t)?;
        stage_one_pv = checked(stage_one_pv.checked_add(pv), "stage-one present value")?;
        year_by_year.push(YearDetail {
            year: t,
            dividend,
            pv,
        });
    }

    // --- Stage two: perpetuity growth at the horizon ---
    let terminal_dividend = checked(
        initial_dividend.checked_mul(growth_factor(g, horizon_years + 1)),
        "terminal dividend",
    )?;
    let terminal_value = checked(
        terminal_dividend
            .checked_mul(Decimal::ONE + g)
            .and_then(|next| next.checked_div(r - g)),
        "terminal value",
    )?;
    let terminal_value_pv = present_value(terminal_value, r, horizon_years)?;

    let fair_value = checked(stage_one_pv.checked_add(terminal_value_pv), "fair value")?;
    let adjusted_fair_value = checked(
        fair_value.checked_mul(Decimal::ONE - margin_of_safety),
        "adjusted fair value",
    )?;
    let upside = checked(adjusted_fair_value.checked_sub(input.price), "upside")?;
    let upside_pct = checked(
        adjusted_fair_value
            .checked_div(input.price)
            .map(|ratio| ratio - Decimal::ONE),
        "upside percentage",
    )?;

    let terminal_pct = if fair_value.is_zero() {
        Decimal::ZERO
    } else {
        terminal_value_pv / fair_value * dec!(100)
    };

    // --- Reasonableness warnings ---
    if terminal_pct > dec!(75) {
        warnings.push(format!(
            "Terminal value is {}% of fair value; result is dominated by the perpetuity assumption",
            terminal_pct.round_dp(1)
        ));
    }
    if r - g < dec!(0.01) {
        warnings.push(format!(
            "Discount rate ({r}) is within one percentage point of growth ({g}); fair value is highly sensitive"
        ));
    }
    if payout.is_zero() {
        warnings.push("Payout of zero implies no dividends and a fair value of zero".into());
    }

    let output = ValuationResult {
        initial_dividend,
        stage_one_pv,
        terminal_dividend,
        terminal_value,
        terminal_value_pv,
        terminal_pct,
        fair_value,
        adjusted_fair_value,
        price: input.price,
        upside,
        upside_pct,
        classification: classify(upside),
        year_by_year,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Two-stage dividend discount model with margin of safety",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Overflow means the spread between discount rate and growth is too narrow
/// for the inputs to be represented.
fn checked(value: Option<Decimal>, what: &str) -> FairValueResult<Decimal> {
    value.ok_or_else(|| {
        FairValueError::InvalidAssumptions(format!(
            "{what} exceeds the representable range; widen the spread between discount rate and growth."
        ))
    })
}

fn validate_input(input: &DdmInput) -> FairValueResult<()> {
    if input.price <= Decimal::ZERO {
        return Err(FairValueError::InsufficientData(
            "Current price must be positive.".into(),
        ));
    }
    if input.eps <= Decimal::ZERO {
        return Err(FairValueError::InsufficientData(
            "Earnings per share must be positive for a dividend valuation.".into(),
        ));
    }
    input.params.validate()?;
    if input.discount_rate <= input.params.growth {
        return Err(FairValueError::InvalidAssumptions(format!(
            "Discount rate ({}) must exceed growth ({}) for a convergent terminal value.",
            input.discount_rate, input.params.growth
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
