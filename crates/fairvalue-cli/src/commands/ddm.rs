use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fairvalue_core::valuation::ddm::{self, DdmInput, ProjectionParameters};

use super::ParamArgs;
use crate::input;

/// Arguments for an offline DDM valuation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DdmArgs {
    /// Current share price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Trailing twelve-month earnings per share
    #[arg(long)]
    pub eps: Option<Decimal>,

    /// Required return (e.g. 0.12 for 12%)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    #[command(flatten)]
    pub params: ParamArgs,

    /// Path to a JSON or TOML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_ddm(args: DdmArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ddm_input: DdmInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        DdmInput {
            price: args.price.ok_or("--price is required (or provide --input)")?,
            eps: args.eps.ok_or("--eps is required (or provide --input)")?,
            discount_rate: args
                .discount_rate
                .ok_or("--discount-rate is required (or provide --input)")?,
            params: args.params.apply(ProjectionParameters::default()),
        }
    };
    let result = ddm::calculate_ddm(&ddm_input)?;
    Ok(serde_json::to_value(result)?)
}
