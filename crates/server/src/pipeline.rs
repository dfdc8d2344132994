//! Request pipeline for alias operations.
//!
//! Every operation moves through the same stages:
//!
//! ```text
//! Received -> Authenticated -> Authorized (Delete only) -> Applied
//!     \______________\________________\___________________-> Rejected
//! ```
//!
//! Resolve is public and skips straight to the store. Save and Delete require
//! a verified credential, and Delete additionally requires the admin privilege
//! from the identity authority. A rejected operation carries exactly one
//! `ErrorKind`; nothing is retried here, only inside `SsoClient`.

use crate::auth::{AuthError, CredentialVerifier};
use crate::metrics;
use shortlink_core::{Alias, CallerIdentity, TargetUrl};
use shortlink_sso::{SsoClient, SsoError};
use shortlink_store::{AliasSaver, AliasStore, StoreError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant as StdInstant;
use tokio::time::Instant;

/// An alias operation and its inputs.
#[derive(Clone, Debug)]
pub enum Operation {
    /// Bind a target to an explicit or generated alias.
    Save {
        alias: Option<Alias>,
        target: TargetUrl,
    },
    /// Remove an alias.
    Delete { alias: Alias },
    /// Look up an alias.
    Resolve { alias: Alias },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Save { .. } => "save",
            Self::Delete { .. } => "delete",
            Self::Resolve { .. } => "resolve",
        }
    }
}

/// An inbound operation with the caller's raw credential, if any.
#[derive(Clone, Debug)]
pub struct Envelope {
    pub operation: Operation,
    pub credential: Option<String>,
}

/// Successful result of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Saved { alias: Alias },
    Deleted,
    Resolved { target: TargetUrl },
}

/// Where an operation is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Received,
    Authenticated,
    Authorized,
    Applied,
    Rejected,
}

/// Why an operation was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    Conflict,
    NotFound,
    Exhausted,
    RemoteUnavailable,
    RemoteRejected,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Exhausted => "exhausted",
            Self::RemoteUnavailable => "remote_unavailable",
            Self::RemoteRejected => "remote_rejected",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected operation: one kind plus a human-readable detail.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl PipelineError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        let kind = match &e {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::AlreadyExists(_) => ErrorKind::Conflict,
            StoreError::Exhausted { .. } => ErrorKind::Exhausted,
            StoreError::Database(_) | StoreError::Config(_) | StoreError::Internal(_) => {
                ErrorKind::Internal
            }
        };
        Self::new(kind, e.to_string())
    }
}

impl From<AuthError> for PipelineError {
    fn from(e: AuthError) -> Self {
        Self::new(ErrorKind::Unauthenticated, e.to_string())
    }
}

impl From<SsoError> for PipelineError {
    fn from(e: SsoError) -> Self {
        let kind = match &e {
            SsoError::Unavailable { .. } => ErrorKind::RemoteUnavailable,
            SsoError::Rejected { .. } => ErrorKind::RemoteRejected,
            SsoError::Config(_) => ErrorKind::Internal,
        };
        Self::new(kind, e.to_string())
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Orchestrates authentication, authorization and store access.
#[derive(Clone)]
pub struct RequestPipeline {
    store: Arc<dyn AliasStore>,
    verifier: Arc<dyn CredentialVerifier>,
    sso: SsoClient,
    saver: AliasSaver,
}

impl RequestPipeline {
    pub fn new(
        store: Arc<dyn AliasStore>,
        verifier: Arc<dyn CredentialVerifier>,
        sso: SsoClient,
        saver: AliasSaver,
    ) -> Self {
        Self {
            store,
            verifier,
            sso,
            saver,
        }
    }

    pub fn store(&self) -> &Arc<dyn AliasStore> {
        &self.store
    }

    pub fn sso(&self) -> &SsoClient {
        &self.sso
    }

    /// Run one operation to a terminal state.
    ///
    /// `deadline` bounds every identity authority call made on the way.
    pub async fn execute(
        &self,
        envelope: Envelope,
        deadline: Option<Instant>,
    ) -> PipelineResult<Outcome> {
        let Envelope {
            operation,
            credential,
        } = envelope;
        let credential = credential.as_deref();

        match operation {
            Operation::Save { alias, target } => self
                .save(credential, alias, target)
                .await
                .map(|alias| Outcome::Saved { alias }),
            Operation::Delete { alias } => self
                .delete(credential, &alias, deadline)
                .await
                .map(|()| Outcome::Deleted),
            Operation::Resolve { alias } => self
                .resolve(&alias)
                .await
                .map(|target| Outcome::Resolved { target }),
        }
    }

    /// Save `target` under `alias`, or under a generated alias when `None`.
    pub async fn save(
        &self,
        credential: Option<&str>,
        alias: Option<Alias>,
        target: TargetUrl,
    ) -> PipelineResult<Alias> {
        self.observe("save", self.apply_save(credential, alias, target))
            .await
    }

    /// Delete `alias`. Requires the admin privilege.
    pub async fn delete(
        &self,
        credential: Option<&str>,
        alias: &Alias,
        deadline: Option<Instant>,
    ) -> PipelineResult<()> {
        self.observe("delete", self.apply_delete(credential, alias, deadline))
            .await
    }

    /// Look up the target of `alias`.
    pub async fn resolve(&self, alias: &Alias) -> PipelineResult<TargetUrl> {
        self.observe("resolve", self.apply_resolve(alias)).await
    }

    async fn apply_save(
        &self,
        credential: Option<&str>,
        alias: Option<Alias>,
        target: TargetUrl,
    ) -> PipelineResult<Alias> {
        let identity = self.authenticate(credential)?;
        let record = self.saver.save(self.store.as_ref(), alias, target).await?;
        tracing::info!(
            alias = %record.alias,
            target = %record.target,
            user_id = %identity.user_id,
            stage = ?Stage::Applied,
            "Alias saved"
        );
        Ok(record.alias)
    }

    async fn apply_delete(
        &self,
        credential: Option<&str>,
        alias: &Alias,
        deadline: Option<Instant>,
    ) -> PipelineResult<()> {
        let identity = self.authenticate(credential)?;

        let decision = self.sso.is_admin(&identity, deadline).await?;
        if let Err(detail) = decision.require() {
            return Err(PipelineError::new(ErrorKind::Forbidden, detail));
        }
        tracing::debug!(
            user_id = %identity.user_id,
            privilege = %decision.privilege,
            stage = ?Stage::Authorized,
            "Privilege granted"
        );

        self.store.delete(alias).await?;
        tracing::info!(
            alias = %alias,
            user_id = %identity.user_id,
            stage = ?Stage::Applied,
            "Alias deleted"
        );
        Ok(())
    }

    async fn apply_resolve(&self, alias: &Alias) -> PipelineResult<TargetUrl> {
        let record = self.store.resolve(alias).await?;
        tracing::debug!(alias = %alias, target = %record.target, "Alias resolved");
        Ok(record.target)
    }

    fn authenticate(&self, credential: Option<&str>) -> PipelineResult<CallerIdentity> {
        let identity = self.verifier.verify(credential)?;
        tracing::debug!(
            user_id = %identity.user_id,
            stage = ?Stage::Authenticated,
            "Caller authenticated"
        );
        Ok(identity)
    }

    async fn observe<T>(
        &self,
        operation: &'static str,
        run: impl Future<Output = PipelineResult<T>>,
    ) -> PipelineResult<T> {
        tracing::debug!(operation, stage = ?Stage::Received, "Operation received");
        let started = StdInstant::now();
        let result = run.await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind.as_str(),
        };
        metrics::record_operation(operation, outcome, started.elapsed());

        if let Err(e) = &result {
            match e.kind {
                ErrorKind::Internal | ErrorKind::RemoteRejected | ErrorKind::RemoteUnavailable => {
                    tracing::error!(
                        operation,
                        kind = %e.kind,
                        detail = %e.detail,
                        stage = ?Stage::Rejected,
                        "Operation failed"
                    );
                }
                _ => {
                    tracing::info!(
                        operation,
                        kind = %e.kind,
                        detail = %e.detail,
                        stage = ?Stage::Rejected,
                        "Operation rejected"
                    );
                }
            }
        }
        result
    }
}
