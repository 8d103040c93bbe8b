// ⚠️ Error taxonomy for the expense services
// Store + uploader failures bubble unchanged to the form controller

use crate::models::ExpenseStatus;
use thiserror::Error;

/// Result type for expense operations
pub type Result<T> = std::result::Result<T, ExpenseError>;

#[derive(Error, Debug)]
pub enum ExpenseError {
    /// Missing, oversized or wrongly typed input. Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The remote backend has no implementation yet.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Only raised under the strict transition policy
    #[error("Cannot move expense {id} from {from} to {to}")]
    InvalidStatusTransition {
        id: String,
        from: ExpenseStatus,
        to: ExpenseStatus,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExpenseError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ExpenseError::InvalidInput(msg.into())
    }

    pub fn not_implemented(msg: impl Into<String>) -> Self {
        ExpenseError::NotImplemented(msg.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ExpenseError::InvalidInput(_))
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, ExpenseError::NotImplemented(_))
    }
}
