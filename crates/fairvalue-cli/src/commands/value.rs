use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fairvalue_core::config::ProviderConfig;
use fairvalue_core::report::{evaluate, MetricsReport};
use fairvalue_core::types::ComputationOutput;
use fairvalue_core::valuation::ddm::{ProjectionParameters, ValuationResult};
use fairvalue_core::FairValueResult;

use super::ParamArgs;
use crate::providers::{report_warnings, Fetched, Providers};

/// Arguments for fetch-then-value
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ValueArgs {
    /// Ticker, with or without exchange suffix
    pub ticker: String,

    #[command(flatten)]
    pub params: ParamArgs,

    /// Override the CAPM discount rate
    #[arg(long)]
    pub discount_rate: Option<Decimal>,
}

pub fn run_value(args: ValueArgs, config: ProviderConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let providers = Providers::from_config(config)?;
    let fetched = providers.fetch(&args.ticker)?;
    let params = args.params.apply(fetched.report.default_parameters());
    Ok(valuation_value(&fetched, params, args.discount_rate)?)
}

/// Run the compute action and fold the fetch-time notes into its envelope.
pub fn valuation_value(
    fetched: &Fetched,
    params: ProjectionParameters,
    discount_override: Option<Decimal>,
) -> FairValueResult<Value> {
    let output = evaluate(&fetched.facts, &fetched.report, params, discount_override)?;
    Ok(merge_notes(output, &fetched.report, discount_override.is_some()))
}

fn merge_notes(
    output: ComputationOutput<ValuationResult>,
    report: &MetricsReport,
    overridden: bool,
) -> Value {
    let mut warnings = report_warnings(report);
    warnings.extend(output.warnings.iter().cloned());
    let mut value = serde_json::to_value(&output).unwrap_or_default();
    if let Value::Object(map) = &mut value {
        map.insert("warnings".into(), json!(warnings));
        map.insert(
            "market".into(),
            json!({
                "symbol": report.symbol,
                "currency": report.currency,
                "discount_rate_source": if overridden { "override" } else { "capm" },
                "risk_free_rate": report.risk_free.rate,
            }),
        );
    }
    value
}
