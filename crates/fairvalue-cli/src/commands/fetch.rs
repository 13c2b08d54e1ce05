use clap::Args;
use serde_json::Value;

use fairvalue_core::config::ProviderConfig;

use crate::providers::{report_value, Providers};

/// Arguments for the fetch action
#[derive(Args)]
pub struct FetchArgs {
    /// Ticker, with or without exchange suffix (e.g. PETR4 or PETR4.SA)
    pub ticker: String,
}

pub fn run_fetch(args: FetchArgs, config: ProviderConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let providers = Providers::from_config(config)?;
    let fetched = providers.fetch(&args.ticker)?;
    Ok(report_value(&fetched.report))
}
