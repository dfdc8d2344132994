//! Retry classification and backoff for identity authority calls.
//!
//! Whether a failed attempt is retried depends on what the call does:
//! read-only lookups can be repeated freely, while account creation and login
//! are only repeated when the request plausibly never reached the authority.

use rand::Rng;
use shortlink_core::config::SsoConfig;
use std::error::Error as _;
use std::time::Duration;
use tonic::{Code, Status};

/// How safely a call can be repeated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// Has no side effects on the authority (`IsAdmin`).
    ReadOnly,
    /// Creates state or mints credentials (`Register`, `Login`).
    NonIdempotent,
}

/// Why a single attempt failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    /// The attempt did not complete within its timeout.
    Timeout,
    /// The authority could not be reached.
    Transport,
    /// The authority answered with a status code.
    Status(Code),
}

impl FailureClass {
    /// Classify a gRPC status. tonic keeps the underlying error as the source
    /// of an `Unavailable` it produced locally (refused connection, broken
    /// stream). An `Unavailable` answered by the authority itself has no source.
    pub fn of(status: &Status) -> Self {
        match status.code() {
            Code::Unavailable if status.source().is_some() => Self::Transport,
            code => Self::Status(code),
        }
    }

    /// Whether this failure may be retried for a call of `kind`.
    pub fn is_transient(&self, kind: CallKind) -> bool {
        match (self, kind) {
            (Self::Timeout | Self::Transport, _) => true,
            (Self::Status(Code::DeadlineExceeded), _) => true,
            (
                Self::Status(Code::NotFound | Code::Aborted | Code::Unavailable),
                CallKind::ReadOnly,
            ) => true,
            (Self::Status(_), _) => false,
        }
    }
}

/// What to do after a failed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Stop,
}

/// Decide whether attempt number `attempt` (1-based) should be followed by another.
pub fn decide(kind: CallKind, failure: FailureClass, attempt: u32, max_attempts: u32) -> RetryDecision {
    if failure.is_transient(kind) && attempt < max_attempts {
        RetryDecision::Retry
    } else {
        RetryDecision::Stop
    }
}

/// Attempt limits and pacing.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Maximum attempts per logical call, the first included.
    pub max_attempts: u32,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
    /// Base delay; the delay after attempt `n` is `n * backoff`, jittered by ±10%.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &SsoConfig) -> Self {
        Self {
            max_attempts: config.retries_count.max(1),
            attempt_timeout: config.timeout(),
            backoff: config.backoff(),
        }
    }

    /// Delay to wait after failed attempt number `attempt`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let base = self.backoff.saturating_mul(attempt.max(1));
        if base.is_zero() {
            return base;
        }
        let factor = rand::rng().random_range(0.9..=1.1);
        Duration::try_from_secs_f64(base.as_secs_f64() * factor).unwrap_or(base)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            attempt_timeout: Duration::from_secs(5),
            backoff: Duration::from_millis(50),
        }
    }
}


/// An `Unavailable` status shaped like the ones tonic produces when the
/// connection itself fails.
#[cfg(test)]
pub(crate) fn transport_unavailable(message: &str) -> Status {
    let mut status = Status::unavailable(message);
    status.set_source(std::sync::Arc::new(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        message.to_string(),
    )));
    status
}
