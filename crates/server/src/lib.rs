//! HTTP front end for shortlink.
//!
//! This crate provides:
//! - The authentication gate (bearer credential verification)
//! - The request pipeline for Save, Delete and Resolve
//! - Account endpoints proxied to the identity authority
//! - Route wiring, API errors and Prometheus metrics

pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use auth::{AuthError, CredentialVerifier, JwtVerifier, TraceId};
pub use error::ApiError;
pub use pipeline::{Envelope, ErrorKind, Operation, Outcome, PipelineError, RequestPipeline};
pub use routes::create_router;
pub use state::AppState;
