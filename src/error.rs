//! Error types
//!
//! Two layers: `M40Error` aborts a whole request (bad input, unreadable
//! tables, malformed token), `ScenarioError` is attached to a single
//! scenario and never stops the batch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request-level failure
#[derive(Debug, Error)]
pub enum M40Error {
    #[error("Invalid input: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Invalid strategy token: {0}")]
    Token(String),

    #[error("Table load error: {0}")]
    TableLoad(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl M40Error {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        M40Error::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for M40Error {
    fn from(e: serde_json::Error) -> Self {
        M40Error::Serialization(e.to_string())
    }
}

/// Failure evaluating one candidate strategy
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioError {
    #[error("no UMA value available for {year}")]
    MissingUma { year: i32 },

    #[error("date arithmetic failed: {detail}")]
    DateArithmetic { detail: String },

    #[error("{weeks} contribution weeks, at least {required} required")]
    InsufficientWeeks { weeks: u32, required: u32 },

    #[error("invalid strategy: {detail}")]
    InvalidStrategy { detail: String },
}

pub type M40Result<T> = Result<T, M40Error>;
