//! Client for the identity authority (SSO) that issues credentials and answers
//! privilege questions for shortlink.
//!
//! - `proto`: wire messages and the gRPC service client
//! - `api`: the `AuthApi` capability trait and its gRPC implementation
//! - `retry`: attempt classification and backoff policy
//! - `client`: `SsoClient`, which wraps an `AuthApi` in the retry policy

pub mod api;
pub mod client;
pub mod error;
pub mod proto;
pub mod retry;

pub use api::{AuthApi, GrpcAuthApi};
pub use client::SsoClient;
pub use error::{SsoError, SsoResult};
pub use retry::{CallKind, FailureClass, RetryDecision, RetryPolicy, decide};
pub use tonic::Code;
