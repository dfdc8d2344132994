//! Retrying identity authority client.

use crate::api::{AuthApi, GrpcAuthApi};
use crate::error::{SsoError, SsoResult};
use crate::retry::{CallKind, FailureClass, RetryDecision, RetryPolicy, decide};
use shortlink_core::config::SsoConfig;
use shortlink_core::{CallerIdentity, Privilege, PrivilegeDecision, UserId};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tonic::Status;

/// Identity authority client.
///
/// Every logical call is bounded by the retry policy and, when given, by the
/// caller's deadline: no attempt or backoff sleep runs past it.
#[derive(Clone)]
pub struct SsoClient {
    api: Arc<dyn AuthApi>,
    policy: RetryPolicy,
    app_id: i32,
}

impl std::fmt::Debug for SsoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoClient")
            .field("policy", &self.policy)
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

struct Failure {
    class: FailureClass,
    message: String,
}

impl Failure {
    fn from_status(status: Status) -> Self {
        Self {
            class: FailureClass::of(&status),
            message: status.message().to_string(),
        }
    }

    fn into_error(self, method: &'static str, kind: CallKind, attempts: u32) -> SsoError {
        match self.class {
            FailureClass::Status(code) if !self.class.is_transient(kind) => SsoError::Rejected {
                method,
                code,
                message: self.message,
            },
            _ => SsoError::Unavailable {
                method,
                attempts,
                reason: self.message,
            },
        }
    }
}

impl SsoClient {
    pub fn new(api: Arc<dyn AuthApi>, policy: RetryPolicy, app_id: i32) -> Self {
        Self {
            api,
            policy,
            app_id,
        }
    }

    /// Build a gRPC-backed client from configuration. Does not connect.
    pub fn from_config(config: &SsoConfig) -> SsoResult<Self> {
        let api = GrpcAuthApi::connect_lazy(&config.address)?;
        tracing::info!(
            address = %config.address,
            max_attempts = config.retries_count,
            timeout_ms = config.timeout_ms,
            "Identity authority client configured"
        );
        Ok(Self::new(
            Arc::new(api),
            RetryPolicy::from_config(config),
            config.app_id,
        ))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn app_id(&self) -> i32 {
        self.app_id
    }

    /// Ask whether `identity` holds the admin privilege.
    pub async fn is_admin(
        &self,
        identity: &CallerIdentity,
        deadline: Option<Instant>,
    ) -> SsoResult<PrivilegeDecision> {
        let api = self.api.as_ref();
        let user_id = identity.user_id.get();
        let granted = self
            .call("IsAdmin", CallKind::ReadOnly, deadline, || api.is_admin(user_id))
            .await?;
        Ok(PrivilegeDecision {
            user_id: identity.user_id,
            privilege: Privilege::Admin,
            granted,
        })
    }

    /// Create an account.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        deadline: Option<Instant>,
    ) -> SsoResult<UserId> {
        let api = self.api.as_ref();
        let id = self
            .call("Register", CallKind::NonIdempotent, deadline, || {
                api.register(email, password)
            })
            .await?;
        Ok(UserId::new(id))
    }

    /// Exchange credentials for a token issued for this application.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        deadline: Option<Instant>,
    ) -> SsoResult<String> {
        let api = self.api.as_ref();
        let app_id = self.app_id;
        self.call("Login", CallKind::NonIdempotent, deadline, || {
            api.login(email, password, app_id)
        })
        .await
    }

    /// Time the next attempt may take, or `None` once the deadline has passed.
    fn attempt_budget(&self, deadline: Option<Instant>) -> Option<Duration> {
        match deadline {
            None => Some(self.policy.attempt_timeout),
            Some(deadline) => {
                let now = Instant::now();
                (now < deadline).then(|| self.policy.attempt_timeout.min(deadline - now))
            }
        }
    }

    async fn call<T, F, Fut>(
        &self,
        method: &'static str,
        kind: CallKind,
        deadline: Option<Instant>,
        mut op: F,
    ) -> SsoResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Status>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            let Some(budget) = self.attempt_budget(deadline) else {
                return Err(SsoError::Unavailable {
                    method,
                    attempts: attempt,
                    reason: "request deadline elapsed".to_string(),
                });
            };
            attempt += 1;

            tracing::debug!(method, attempt, max_attempts, "Calling identity authority");
            let failure = match tokio::time::timeout(budget, op()).await {
                Ok(Ok(value)) => {
                    tracing::debug!(method, attempt, "Identity authority responded");
                    return Ok(value);
                }
                Ok(Err(status)) => Failure::from_status(status),
                Err(_) => Failure {
                    class: FailureClass::Timeout,
                    message: format!("attempt timed out after {budget:?}"),
                },
            };

            match decide(kind, failure.class, attempt, max_attempts) {
                RetryDecision::Retry => {
                    let delay = self.policy.backoff_for(attempt);
                    if let Some(deadline) = deadline
                        && Instant::now()
                            .checked_add(delay)
                            .is_none_or(|resume| resume >= deadline)
                    {
                        tracing::warn!(
                            method,
                            attempt,
                            error = %failure.message,
                            "Identity authority call failed; no time left to retry"
                        );
                        return Err(SsoError::Unavailable {
                            method,
                            attempts: attempt,
                            reason: failure.message,
                        });
                    }
                    tracing::warn!(
                        method,
                        attempt,
                        max_attempts,
                        failure = ?failure.class,
                        error = %failure.message,
                        delay_ms = delay.as_millis() as u64,
                        "Identity authority call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Stop => {
                    tracing::warn!(
                        method,
                        attempt,
                        failure = ?failure.class,
                        error = %failure.message,
                        "Identity authority call failed"
                    );
                    return Err(failure.into_error(method, kind, attempt));
                }
            }
        }
    }
}
