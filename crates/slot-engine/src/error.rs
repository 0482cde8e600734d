//! Error types for slot-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid time span: {0}")]
    InvalidSpan(String),

    #[error("Invalid date period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid daily window: {0}")]
    InvalidWindow(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    #[error("Instant is not UTC: {0}")]
    NonUtcInstant(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Data source error: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
