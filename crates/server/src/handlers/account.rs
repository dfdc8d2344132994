//! Account endpoints, proxied to the identity authority.

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::pipeline::{ErrorKind, PipelineError};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use shortlink_sso::{Code, SsoError};
use std::time::Instant;

/// Body of `POST /register` and `POST /login`.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl CredentialsRequest {
    fn validate(&self) -> ApiResult<()> {
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            })
            && !email.chars().any(char::is_whitespace);
        if !well_formed {
            return Err(ApiError::BadRequest(format!("invalid email {:?}", self.email)));
        }
        if self.password.is_empty() {
            return Err(ApiError::BadRequest("password must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

fn outcome_label<T>(result: &ApiResult<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.code(),
    }
}

/// POST /register - Create an account.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(request) = payload?;
    request.validate()?;

    let started = Instant::now();
    let result: ApiResult<(StatusCode, Json<RegisterResponse>)> = match state
        .pipeline
        .sso()
        .register(request.email.trim(), &request.password, state.deadline())
        .await
    {
        Ok(user_id) => {
            tracing::info!(user_id = %user_id, "User registered");
            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse {
                    user_id: user_id.get(),
                }),
            ))
        }
        Err(SsoError::Rejected {
            code: Code::AlreadyExists,
            ..
        }) => Err(PipelineError::new(ErrorKind::Conflict, "user already exists").into()),
        Err(e) => Err(PipelineError::from(e).into()),
    };
    metrics::record_operation("register", outcome_label(&result), started.elapsed());
    result
}

/// POST /login - Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let started = Instant::now();
    let result: ApiResult<Json<LoginResponse>> = match state
        .pipeline
        .sso()
        .login(request.email.trim(), &request.password, state.deadline())
        .await
    {
        Ok(token) => {
            tracing::debug!(email = %request.email.trim(), "User logged in");
            Ok(Json(LoginResponse { token }))
        }
        Err(SsoError::Rejected { code, message, .. })
            if matches!(
                code,
                Code::InvalidArgument
                    | Code::NotFound
                    | Code::Unauthenticated
                    | Code::PermissionDenied
            ) =>
        {
            tracing::info!(code = ?code, reason = %message, "Login refused");
            Err(ApiError::InvalidCredentials)
        }
        Err(e) => Err(PipelineError::from(e).into()),
    };
    metrics::record_operation("login", outcome_label(&result), started.elapsed());
    result
}
