//! Authentication gate and request tracing.

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use shortlink_core::config::AuthConfig;
use shortlink_core::{CallerIdentity, UserId};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the request correlation ID, in both directions.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Client-supplied trace IDs are cut to this many characters.
const MAX_TRACE_ID_LEN: usize = 128;

/// Correlates the log lines of one request. Taken from the `x-trace-id`
/// request header when it holds anything printable, otherwise a fresh UUID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceId(String);

impl TraceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Keep only printable ASCII from a caller-chosen ID so it cannot forge
    /// log lines. Falls back to a generated ID when nothing usable remains.
    pub fn from_client(value: &str) -> Self {
        let kept: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();
        match kept.trim() {
            "" => Self::generate(),
            _ => Self(kept),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map_or_else(Self::generate, Self::from_client)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a credential was refused.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer credential")]
    Missing,

    #[error("credential expired")]
    Expired,

    #[error("invalid credential: {0}")]
    Invalid(String),

    #[error("credential carries no usable uid claim")]
    MissingIdentity,
}

/// Turns a raw bearer credential into a caller identity.
///
/// Verification is local: implementations must not perform network I/O.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credential: Option<&str>) -> Result<CallerIdentity, AuthError>;
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    uid: Option<serde_json::Value>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    app_id: Option<i32>,
    exp: i64,
}

/// Parse the `uid` claim. Issuers may encode it as an integral float.
fn parse_uid(value: &serde_json::Value) -> Option<i64> {
    let serde_json::Value::Number(number) = value else {
        return None;
    };
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// HS256 credential verifier sharing its secret with the identity authority.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, clock_skew: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = clock_skew.as_secs();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.app_secret, Duration::from_secs(config.clock_skew_secs))
    }
}

impl CredentialVerifier for JwtVerifier {
    fn verify(&self, credential: Option<&str>) -> Result<CallerIdentity, AuthError> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Missing)?;

        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation).map_err(
            |e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            },
        )?;
        let claims = data.claims;

        let user_id = claims
            .uid
            .as_ref()
            .and_then(parse_uid)
            .ok_or(AuthError::MissingIdentity)?;
        let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp)
            .map_err(|e| AuthError::Invalid(format!("exp out of range: {e}")))?;

        Ok(CallerIdentity {
            user_id: UserId::new(user_id),
            email: claims.email,
            app_id: claims.app_id,
            expires_at,
        })
    }
}

/// Extract the bearer credential from the Authorization header.
/// Per RFC 6750, the "Bearer" scheme is case-insensitive.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(&v[7..])
            } else {
                None
            }
        })
}

/// Run each request inside a span carrying its trace ID and echo the ID back.
pub async fn trace_middleware(mut req: Request, next: Next) -> Response {
    let trace_id = TraceId::from_headers(req.headers());
    let span = tracing::info_span!("request", trace_id = %trace_id);
    req.extensions_mut().insert(trace_id.clone());

    let mut response = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(trace_id.as_str()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}
