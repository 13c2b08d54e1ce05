//! Boundary between the calculator and external data providers.
//!
//! Providers are traits so the shell can be driven by the live HTTP adapters
//! or by in-memory fakes. Absent facts are `None` or empty series; provider
//! failures surface as [`FairValueError::DataUnavailable`].

#[cfg(feature = "live")]
pub mod central_bank;
#[cfg(feature = "live")]
pub mod http;
#[cfg(feature = "live")]
pub mod yahoo;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::FairValueError;
use crate::types::{
    BenchmarkSeries, DividendSeries, EarningsSeries, PriceSeries, QuoteSnapshot, Rate,
};
use crate::FairValueResult;

/// Provider ticker, upper-cased and exchange-suffixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Normalise user input. Bare tickers get `exchange_suffix`; inputs that
    /// already carry a suffix (`.`) or name an index (`^`) are kept as is.
    pub fn parse(input: &str, exchange_suffix: &str) -> FairValueResult<Self> {
        let trimmed = input.trim().to_ascii_uppercase();
        if trimmed.is_empty() {
            return Err(FairValueError::InvalidInput {
                field: "ticker".into(),
                reason: "Ticker must not be empty".into(),
            });
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
        {
            return Err(FairValueError::InvalidInput {
                field: "ticker".into(),
                reason: format!("'{trimmed}' contains unsupported characters"),
            });
        }
        if trimmed.contains('.') || trimmed.starts_with('^') {
            Ok(Self(trimmed))
        } else {
            Ok(Self(format!("{trimmed}{}", exchange_suffix.to_ascii_uppercase())))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stock price history together with the dividend events over the same range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub prices: PriceSeries,
    pub dividends: DividendSeries,
}

/// Read-only market-data source reachable by ticker.
pub trait MarketDataProvider {
    fn quote(&self, symbol: &Symbol) -> FairValueResult<QuoteSnapshot>;

    fn history(&self, symbol: &Symbol) -> FairValueResult<PriceHistory>;

    /// Net income by period, or `None` when the provider has no statement.
    fn earnings(&self, symbol: &Symbol) -> FairValueResult<Option<EarningsSeries>>;

    /// Trailing history of the fixed comparison index.
    fn benchmark(&self) -> FairValueResult<BenchmarkSeries>;
}

/// Source of the latest policy/benchmark rate, as a fraction.
pub trait RiskFreeRateProvider {
    fn latest_rate(&self) -> FairValueResult<Rate>;
}

/// Everything a single fetch action learns about one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketFacts {
    pub symbol: Symbol,
    pub quote: QuoteSnapshot,
    pub prices: PriceSeries,
    pub dividends: DividendSeries,
    pub earnings: Option<EarningsSeries>,
    pub benchmark: BenchmarkSeries,
}

/// One call per fact; any provider failure aborts the fetch.
///
/// When the quote carries no price, the latest close of the price history is
/// used instead.
pub fn fetch_market_facts(
    provider: &dyn MarketDataProvider,
    symbol: &Symbol,
) -> FairValueResult<MarketFacts> {
    let mut quote = provider.quote(symbol)?;
    let history = provider.history(symbol)?;
    let earnings = provider.earnings(symbol)?.filter(|e| !e.is_blank());
    let benchmark = provider.benchmark()?;

    if quote.price.is_none() {
        quote.price = history.prices.last_close();
    }

    info!(
        symbol = %symbol,
        closes = history.prices.closes.len(),
        dividends = history.dividends.events.len(),
        earnings_periods = earnings.as_ref().map(|e| e.periods.len()).unwrap_or(0),
        benchmark_points = benchmark.levels.len(),
        "fetched market facts"
    );

    Ok(MarketFacts {
        symbol: symbol.clone(),
        quote,
        prices: history.prices,
        dividends: history.dividends,
        earnings,
        benchmark,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EarningsPeriod, Observation};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    struct StaticProvider {
        quote_price: Option<rust_decimal::Decimal>,
        earnings: Option<EarningsSeries>,
        fail_benchmark: bool,
    }

    impl MarketDataProvider for StaticProvider {
        fn quote(&self, _symbol: &Symbol) -> FairValueResult<QuoteSnapshot> {
            Ok(QuoteSnapshot {
                price: self.quote_price,
                eps: Some(dec!(2.5)),
                ..Default::default()
            })
        }

        fn history(&self, _symbol: &Symbol) -> FairValueResult<PriceHistory> {
            Ok(PriceHistory {
                prices: PriceSeries::new(vec![
                    Observation::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(), dec!(31.2)),
                    Observation::new(NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(), dec!(30.8)),
                ]),
                dividends: DividendSeries::default(),
            })
        }

        fn earnings(&self, _symbol: &Symbol) -> FairValueResult<Option<EarningsSeries>> {
            Ok(self.earnings.clone())
        }

        fn benchmark(&self) -> FairValueResult<BenchmarkSeries> {
            if self.fail_benchmark {
                Err(FairValueError::DataUnavailable("timeout".into()))
            } else {
                Ok(BenchmarkSeries::new("^BVSP", vec![]))
            }
        }
    }

    fn symbol() -> Symbol {
        Symbol::parse("petr4", ".SA").unwrap()
    }

    #[test]
    fn test_symbol_appends_suffix_and_uppercases() {
        assert_eq!(symbol().as_str(), "PETR4.SA");
    }

    #[test]
    fn test_symbol_keeps_existing_suffix_and_indices() {
        assert_eq!(Symbol::parse("vale3.sa", ".SA").unwrap().as_str(), "VALE3.SA");
        assert_eq!(Symbol::parse("^bvsp", ".SA").unwrap().as_str(), "^BVSP");
        assert_eq!(Symbol::parse("AAPL", "").unwrap().as_str(), "AAPL");
    }

    #[test]
    fn test_symbol_rejects_empty_and_odd_characters() {
        assert!(Symbol::parse("   ", ".SA").is_err());
        assert!(Symbol::parse("PETR4/../x", ".SA").is_err());
    }

    #[test]
    fn test_price_falls_back_to_last_close() {
        let provider = StaticProvider {
            quote_price: None,
            earnings: None,
            fail_benchmark: false,
        };
        let facts = fetch_market_facts(&provider, &symbol()).unwrap();
        assert_eq!(facts.quote.price, Some(dec!(31.2)));
    }

    #[test]
    fn test_quote_price_wins_over_history() {
        let provider = StaticProvider {
            quote_price: Some(dec!(32)),
            earnings: None,
            fail_benchmark: false,
        };
        let facts = fetch_market_facts(&provider, &symbol()).unwrap();
        assert_eq!(facts.quote.price, Some(dec!(32)));
    }

    #[test]
    fn test_blank_earnings_become_none() {
        let provider = StaticProvider {
            quote_price: Some(dec!(32)),
            earnings: Some(EarningsSeries::new(vec![EarningsPeriod {
                period_end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
                net_income: None,
            }])),
            fail_benchmark: false,
        };
        let facts = fetch_market_facts(&provider, &symbol()).unwrap();
        assert!(facts.earnings.is_none());
    }

    #[test]
    fn test_provider_failure_propagates() {
        let provider = StaticProvider {
            quote_price: Some(dec!(32)),
            earnings: None,
            fail_benchmark: true,
        };
        assert!(matches!(
            fetch_market_facts(&provider, &symbol()),
            Err(FairValueError::DataUnavailable(_))
        ));
    }
}
