pub mod ddm;
pub mod fetch;
pub mod session;
pub mod value;

use clap::Args;
use rust_decimal::Decimal;

use fairvalue_core::valuation::ddm::ProjectionParameters;

/// Projection overrides shared by `value` and `ddm`.
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// Dividend growth rate (e.g. 0.10 for 10%)
    #[arg(long)]
    pub growth: Option<Decimal>,

    /// Payout ratio (defaults to the estimated payout when fetching)
    #[arg(long)]
    pub payout: Option<Decimal>,

    /// Explicit projection horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Margin of safety applied to the fair value (e.g. 0.2 for 20%)
    #[arg(long, alias = "mos")]
    pub margin: Option<Decimal>,
}

impl ParamArgs {
    pub fn apply(&self, base: ProjectionParameters) -> ProjectionParameters {
        ProjectionParameters {
            growth: self.growth.unwrap_or(base.growth),
            payout: self.payout.unwrap_or(base.payout),
            horizon_years: self.years.unwrap_or(base.horizon_years),
            margin_of_safety: self.margin.unwrap_or(base.margin_of_safety),
        }
    }
}
