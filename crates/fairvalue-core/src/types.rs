use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Beta used when the provider does not publish one.
pub const DEFAULT_BETA: Decimal = dec!(1.0);

/// A single dated observation (close price, index level, dividend amount).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Decimal,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        Self { date, value }
    }
}

fn chronological(mut points: Vec<Observation>) -> Vec<Observation> {
    points.sort_by_key(|p| p.date);
    points
}

/// Dividend events per share, oldest first. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendSeries {
    pub events: Vec<Observation>,
}

impl DividendSeries {
    pub fn new(events: Vec<Observation>) -> Self {
        Self {
            events: chronological(events),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Daily closes of the stock, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub closes: Vec<Observation>,
}

impl PriceSeries {
    pub fn new(closes: Vec<Observation>) -> Self {
        Self {
            closes: chronological(closes),
        }
    }

    pub fn last_close(&self) -> Option<Money> {
        self.closes.last().map(|p| p.value)
    }
}

/// Benchmark index levels over a trailing window, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSeries {
    pub symbol: String,
    pub levels: Vec<Observation>,
}

impl BenchmarkSeries {
    pub fn new(symbol: impl Into<String>, levels: Vec<Observation>) -> Self {
        Self {
            symbol: symbol.into(),
            levels: chronological(levels),
        }
    }
}

/// Net income reported for one fiscal period. `None` marks a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsPeriod {
    pub period_end: NaiveDate,
    pub net_income: Option<Money>,
}

/// Net income by period end, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarningsSeries {
    pub periods: Vec<EarningsPeriod>,
}

impl EarningsSeries {
    pub fn new(mut periods: Vec<EarningsPeriod>) -> Self {
        periods.sort_by_key(|p| p.period_end);
        Self { periods }
    }

    /// True when no period carries a value.
    pub fn is_blank(&self) -> bool {
        self.periods.iter().all(|p| p.net_income.is_none())
    }
}

/// Point-in-time quote facts. Absent fields stay `None`, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub price: Option<Money>,
    pub eps: Option<Money>,
    pub beta: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares_outstanding: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl QuoteSnapshot {
    pub fn beta_or_default(&self) -> Decimal {
        self.beta.unwrap_or(DEFAULT_BETA)
    }

    /// EPS only when it can anchor a valuation.
    pub fn positive_eps(&self) -> Option<Money> {
        self.eps.filter(|e| *e > Decimal::ZERO)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
