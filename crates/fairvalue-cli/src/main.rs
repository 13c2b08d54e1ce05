mod commands;
mod input;
mod logging;
mod output;
mod providers;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use commands::ddm::DdmArgs;
use commands::fetch::FetchArgs;
use commands::session::SessionArgs;
use commands::value::ValueArgs;

/// Dividend discount fair values from live market data
#[derive(Parser)]
#[command(
    name = "fairvalue",
    version,
    about = "Dividend discount fair values from live market data",
    long_about = "Fetches price, earnings, dividends and a benchmark index for a listed \
                  company, estimates a CAPM discount rate plus growth, payout and yield, \
                  and values the stock with a two-stage dividend discount model."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    output: OutputFormat,

    /// TOML file with provider endpoints and defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch market data and show the estimated metrics
    Fetch(FetchArgs),
    /// Fetch market data and compute the fair value
    Value(ValueArgs),
    /// Offline DDM valuation from explicit inputs
    Ddm(DdmArgs),
    /// Interactive session: fetch once, adjust parameters, recompute
    Session(SessionArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    let config = || providers::load_config(cli.config.as_deref());

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Fetch(args) => config()
            .map_err(Into::into)
            .and_then(|c| commands::fetch::run_fetch(args, c)),
        Commands::Value(args) => config()
            .map_err(Into::into)
            .and_then(|c| commands::value::run_value(args, c)),
        Commands::Ddm(args) => commands::ddm::run_ddm(args),
        Commands::Session(args) => {
            let outcome = config()
                .map_err(Into::into)
                .and_then(|c| commands::session::run_session(args, c, &cli.output));
            if let Err(e) = outcome {
                eprintln!("{}: {}", "error".red().bold(), e);
                process::exit(1);
            }
            return;
        }
        Commands::Version => {
            println!("fairvalue {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
