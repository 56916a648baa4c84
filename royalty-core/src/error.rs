//! Core Error Codes Registry
//!
//! Error code format: {area}-{kind}-{sequence}
//! - PAY-*: settlement/payout configuration errors
//! - CHAIN-*: hash-chain configuration errors
//!
//! Per-record data-quality problems are NOT errors: the reader and the
//! aggregator surface them as counted, recoverable line issues. Everything
//! in this enum is fatal for the run that raises it.

use thiserror::Error;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// [PAY-PERIOD-001] Malformed settlement period
    #[error("[PAY-PERIOD-001] Invalid period {value:?}: expected YYYY-MM with a zero-padded month in 01..=12")]
    InvalidPeriod { value: String },

    /// [PAY-INPUT-001] Required input file missing
    #[error("[PAY-INPUT-001] Input file not found: {path}")]
    InputNotFound { path: String },

    /// [PAY-BUDGET-001] Budget cannot be represented in minor units
    #[error("[PAY-BUDGET-001] Budget {value} is not representable in cents")]
    InvalidBudget { value: String },

    /// [CHAIN-CONFIG-001] Non-positive chunk size
    #[error("[CHAIN-CONFIG-001] Chunk size must be a positive integer, got {value}")]
    InvalidChunkSize { value: i64 },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}
