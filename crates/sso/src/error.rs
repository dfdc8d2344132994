//! Identity authority client errors.

use thiserror::Error;
use tonic::Code;

/// Errors surfaced by `SsoClient`.
///
/// Transport detail is collapsed into two outcomes: the authority could not be
/// reached in time (`Unavailable`), or it answered with a terminal failure
/// (`Rejected`).
#[derive(Debug, Error)]
pub enum SsoError {
    #[error("{method}: identity authority unavailable after {attempts} attempt(s): {reason}")]
    Unavailable {
        method: &'static str,
        attempts: u32,
        reason: String,
    },

    #[error("{method}: identity authority rejected the call ({code:?}): {message}")]
    Rejected {
        method: &'static str,
        code: Code,
        message: String,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for identity authority calls.
pub type SsoResult<T> = std::result::Result<T, SsoError>;
