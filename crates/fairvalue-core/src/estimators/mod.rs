//! Pure estimators that turn raw market series into scalar inputs for the
//! valuation engine. Each metric is independent; an undefined metric is
//! `None` and must be omitted rather than fed into a valuation.

pub mod benchmark;
pub mod capm;
pub mod dividend_yield;
pub mod growth;
pub mod payout;
