pub mod config;
pub mod error;
pub mod market_data;
pub mod time_value;
pub mod types;

#[cfg(feature = "estimators")]
pub mod estimators;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(all(feature = "estimators", feature = "valuation"))]
pub mod report;

pub use error::FairValueError;
pub use types::*;

/// Standard result type for all fairvalue operations
pub type FairValueResult<T> = Result<T, FairValueError>;
