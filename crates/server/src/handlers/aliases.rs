//! Alias endpoints.

use crate::auth::extract_bearer_token;
use crate::error::{ApiError, ApiResult};
use crate::routes::RESERVED_PATHS;
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use shortlink_core::{Alias, TargetUrl};

/// Body of `POST /url`.
#[derive(Debug, Deserialize)]
pub struct SaveAliasRequest {
    /// Target URL.
    pub url: String,
    /// Requested alias. Absent or empty means "generate one".
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveAliasResponse {
    pub alias: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

fn parse_requested_alias(raw: &str) -> ApiResult<Alias> {
    let alias = Alias::parse(raw)?;
    if RESERVED_PATHS.contains(&alias.as_str()) {
        return Err(ApiError::BadRequest(format!("alias {alias:?} is reserved")));
    }
    Ok(alias)
}

/// POST /url - Save a target under an explicit or generated alias.
pub async fn save_alias(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SaveAliasRequest>, JsonRejection>,
) -> ApiResult<Json<SaveAliasResponse>> {
    let Json(request) = payload?;

    let target = TargetUrl::parse(&request.url)?;
    let alias = match request.alias.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(parse_requested_alias(raw)?),
    };

    let alias = state
        .pipeline
        .save(extract_bearer_token(&headers), alias, target)
        .await?;

    Ok(Json(SaveAliasResponse {
        alias: alias.to_string(),
    }))
}

/// GET /{alias} - Redirect to the alias target.
pub async fn resolve_alias(
    State(state): State<AppState>,
    Path(alias): Path<String>,
) -> ApiResult<Response> {
    let alias = Alias::parse(&alias)?;
    let target = state.pipeline.resolve(&alias).await?;

    let location = HeaderValue::from_str(target.as_str())
        .map_err(|e| ApiError::Internal(format!("unusable redirect target: {e}")))?;
    Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
}

/// DELETE /{alias} - Remove an alias. Admin only.
pub async fn delete_alias(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(alias): Path<String>,
) -> ApiResult<StatusCode> {
    let alias = Alias::parse(&alias)?;
    state
        .pipeline
        .delete(extract_bearer_token(&headers), &alias, state.deadline())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /health - Check that the alias store is reachable.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.pipeline.store().health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Alias store health check failed");
        ApiError::Internal(e.to_string())
    })?;
    Ok(Json(HealthResponse { status: "ok" }))
}
