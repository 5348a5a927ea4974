use thiserror::Error;

use crate::scoring::FormulaError;
use crate::storage::StorageError;
use crate::transfer::TransferError;

/// Errors surfaced to the form layer by application state operations
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No user is signed in")]
    NoCurrentUser,

    #[error("Scoring error: {0}")]
    Formula(#[from] FormulaError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }
}

/// Trimmed, lowercased form used for every name comparison (titles, handles, import mapping)
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Generates a fresh record id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
