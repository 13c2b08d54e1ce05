use thiserror::Error;

#[derive(Debug, Error)]
pub enum FairValueError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid assumptions: {0}")]
    InvalidAssumptions(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FairValueError {
    fn from(e: serde_json::Error) -> Self {
        FairValueError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for FairValueError {
    fn from(e: toml::de::Error) -> Self {
        FairValueError::ConfigError(e.to_string())
    }
}
