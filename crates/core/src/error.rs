//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid alias: {0}")]
    InvalidAlias(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
