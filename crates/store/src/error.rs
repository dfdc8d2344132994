//! Alias store error types.

use thiserror::Error;

/// Alias store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("alias not found: {0}")]
    NotFound(String),

    #[error("alias already exists: {0}")]
    AlreadyExists(String),

    #[error("no free alias after {attempts} generated candidates")]
    Exhausted { attempts: u32 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Config(e.to_string())
    }
}

/// Result type for alias store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
