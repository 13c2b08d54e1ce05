use std::io::{self, BufRead, Write};
use std::str::FromStr;

use clap::Args;
use colored::Colorize;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::debug;

use fairvalue_core::config::ProviderConfig;
use fairvalue_core::valuation::ddm::ProjectionParameters;
use fairvalue_core::FairValueError;

use super::value::valuation_value;
use crate::output;
use crate::providers::{report_value, Fetched, Providers};
use crate::OutputFormat;

const HELP: &str = "\
commands:
  fetch <TICKER>                 fetch market data and estimates
  set growth <RATE>              dividend growth, 0 to 0.30
  set payout <RATIO>             payout ratio, 0 to 1
  set years <N>                  projection horizon, 1 to 20
  set margin <RATE>              margin of safety, 0 to 0.5
  set discount-rate <RATE|auto>  override or restore the CAPM rate
  compute                        value the fetched ticker
  show                           current ticker and parameters
  help                           this text
  quit                           leave the session";

/// Arguments for the interactive session
#[derive(Args)]
pub struct SessionArgs {
    /// Ticker to fetch on start
    pub ticker: Option<String>,
}

/// A parameter change requested with `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Growth(Decimal),
    Payout(Decimal),
    Years(u32),
    Margin(Decimal),
    /// `None` restores the CAPM estimate.
    DiscountRate(Option<Decimal>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Fetch(String),
    Set(Setting),
    Compute,
    Show,
    Help,
    Quit,
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<SessionCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("fetch", [ticker]) => SessionCommand::Fetch((*ticker).to_string()),
        ("fetch", _) => return Err("usage: fetch <TICKER>".into()),
        ("set", [name, value]) => SessionCommand::Set(parse_setting(name, value)?),
        ("set", _) => return Err("usage: set <param> <value> (see help)".into()),
        ("compute", []) => SessionCommand::Compute,
        ("show", []) => SessionCommand::Show,
        ("help" | "?", []) => SessionCommand::Help,
        ("quit" | "exit", []) => SessionCommand::Quit,
        (other, _) => return Err(format!("unknown command '{other}' (try help)")),
    };
    Ok(Some(command))
}

fn parse_setting(name: &str, value: &str) -> Result<Setting, String> {
    let rate = || {
        Decimal::from_str(value).map_err(|_| format!("'{value}' is not a number"))
    };
    match name.to_ascii_lowercase().replace('_', "-").as_str() {
        "growth" | "g" => Ok(Setting::Growth(rate()?)),
        "payout" => Ok(Setting::Payout(rate()?)),
        "years" | "horizon" => value
            .parse::<u32>()
            .map(Setting::Years)
            .map_err(|_| format!("'{value}' is not a whole number of years")),
        "margin" | "mos" => Ok(Setting::Margin(rate()?)),
        "discount-rate" | "r" => {
            if value.eq_ignore_ascii_case("auto") {
                Ok(Setting::DiscountRate(None))
            } else {
                Ok(Setting::DiscountRate(Some(rate()?)))
            }
        }
        other => Err(format!("unknown parameter '{other}'")),
    }
}

/// What the loop should do after a command.
#[derive(Debug)]
pub enum Step {
    Output(Value),
    Message(String),
    Quit,
}

/// Session state: the last successful fetch plus the working parameters.
pub struct Session {
    providers: Providers,
    current: Option<Fetched>,
    params: ProjectionParameters,
    discount_override: Option<Decimal>,
}

impl Session {
    pub fn new(providers: Providers) -> Self {
        Self {
            providers,
            current: None,
            params: ProjectionParameters::default(),
            discount_override: None,
        }
    }

    pub fn handle(&mut self, command: SessionCommand) -> Result<Step, Box<dyn std::error::Error>> {
        match command {
            SessionCommand::Fetch(ticker) => {
                let fetched = self.providers.fetch(&ticker)?;
                self.params.payout = fetched.report.suggested_payout;
                let value = report_value(&fetched.report);
                self.current = Some(fetched);
                Ok(Step::Output(value))
            }
            SessionCommand::Set(setting) => {
                self.apply(setting)?;
                Ok(Step::Message("ok".into()))
            }
            SessionCommand::Compute => {
                let fetched = self.current.as_ref().ok_or_else(|| {
                    FairValueError::InsufficientData("nothing fetched yet; use fetch <TICKER>".into())
                })?;
                Ok(Step::Output(valuation_value(
                    fetched,
                    self.params,
                    self.discount_override,
                )?))
            }
            SessionCommand::Show => Ok(Step::Output(self.show())),
            SessionCommand::Help => Ok(Step::Message(HELP.into())),
            SessionCommand::Quit => Ok(Step::Quit),
        }
    }

    /// Accept a setting only if the resulting parameters stay valid.
    fn apply(&mut self, setting: Setting) -> Result<(), FairValueError> {
        let mut params = self.params;
        match setting {
            Setting::Growth(g) => params.growth = g,
            Setting::Payout(p) => params.payout = p,
            Setting::Years(n) => params.horizon_years = n,
            Setting::Margin(m) => params.margin_of_safety = m,
            Setting::DiscountRate(rate) => {
                if let Some(r) = rate {
                    if r <= Decimal::ZERO {
                        return Err(FairValueError::InvalidInput {
                            field: "discount_rate".into(),
                            reason: "Discount rate must be positive".into(),
                        });
                    }
                }
                self.discount_override = rate;
                return Ok(());
            }
        }
        params.validate()?;
        self.params = params;
        Ok(())
    }

    fn show(&self) -> Value {
        let report = self.current.as_ref().map(|f| &f.report);
        let capm = report.and_then(|r| r.capm.as_ref()).map(|c| c.discount_rate);
        let (discount_rate, source) = match (self.discount_override, capm) {
            (Some(r), _) => (Some(r), "override"),
            (None, Some(r)) => (Some(r), "capm"),
            (None, None) => (None, "unavailable"),
        };
        json!({
            "result": {
                "symbol": report.map(|r| r.symbol.clone()),
                "price": report.and_then(|r| r.price),
                "growth": self.params.growth,
                "payout": self.params.payout,
                "horizon_years": self.params.horizon_years,
                "margin_of_safety": self.params.margin_of_safety,
                "discount_rate": discount_rate,
                "discount_rate_source": source,
            }
        })
    }
}

pub fn run_session(
    args: SessionArgs,
    config: ProviderConfig,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(Providers::from_config(config)?);
    let interactive = atty::is(atty::Stream::Stdin);

    if let Some(ticker) = args.ticker {
        dispatch(&mut session, SessionCommand::Fetch(ticker), format);
    } else if interactive {
        println!("{HELP}");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("fairvalue> ");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        match parse_command(&line?) {
            Ok(None) => {}
            Ok(Some(command)) => {
                debug!(?command, "session command");
                if !dispatch(&mut session, command, format) {
                    break;
                }
            }
            Err(message) => print_error(&message),
        }
    }
    Ok(())
}

/// Run one command and print its outcome. Returns `false` on quit.
fn dispatch(session: &mut Session, command: SessionCommand, format: &OutputFormat) -> bool {
    match session.handle(command) {
        Ok(Step::Output(value)) => output::format_output(format, &value),
        Ok(Step::Message(text)) => println!("{text}"),
        Ok(Step::Quit) => return false,
        Err(e) => print_error(&e.to_string()),
    }
    true
}

fn print_error(message: &str) {
    eprintln!("{}: {}", "error".red().bold(), message);
}
