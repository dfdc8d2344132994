//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Longest accepted request budget.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;
/// Longest accepted single attempt or retry delay against the identity authority.
pub const MAX_SSO_DURATION_MS: u64 = 600_000;
/// Largest accepted clock skew.
pub const MAX_CLOCK_SKEW_SECS: u64 = 3600;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8082").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Budget for a single request, including every call to the identity authority.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8082".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout_secs(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl ServerConfig {
    /// Get the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(format!(
                "server.request_timeout_secs must be between 1 and {MAX_REQUEST_TIMEOUT_SECS}"
            ));
        }
        Ok(())
    }
}

/// Alias store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// SQLite database file.
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// How long a writer waits on a locked database before failing.
        #[serde(default = "default_busy_timeout_secs")]
        busy_timeout_secs: u64,
    },
    /// Process-local map. Contents are lost on restart.
    Memory,
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/shortlink.db"),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

/// Credential verification configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret used by the identity authority to sign credentials.
    /// WARNING: Prefer SHORTLINK_AUTH__APP_SECRET over storing it in a config file.
    pub app_secret: String,
    /// Accepted clock skew between issuer and verifier, in seconds.
    #[serde(default = "default_clock_skew_secs")]
    pub clock_skew_secs: u64,
}

fn default_clock_skew_secs() -> u64 {
    30
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.app_secret.is_empty() {
            return Err("auth.app_secret must not be empty".to_string());
        }
        if self.clock_skew_secs > MAX_CLOCK_SKEW_SECS {
            return Err(format!(
                "auth.clock_skew_secs must be at most {MAX_CLOCK_SKEW_SECS}"
            ));
        }
        Ok(())
    }
}

/// Identity authority (SSO) client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SsoConfig {
    /// gRPC address, e.g. "localhost:44044" or "http://sso.internal:44044".
    pub address: String,
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_sso_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum attempts per logical call (first attempt included).
    #[serde(default = "default_sso_retries_count")]
    pub retries_count: u32,
    /// Base delay between attempts in milliseconds. Grows linearly per attempt.
    #[serde(default = "default_sso_backoff_ms")]
    pub backoff_ms: u64,
    /// Application ID sent with login requests.
    pub app_id: i32,
}

fn default_sso_timeout_ms() -> u64 {
    5000
}

fn default_sso_retries_count() -> u32 {
    5
}

fn default_sso_backoff_ms() -> u64 {
    50
}

impl SsoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.address.trim().is_empty() {
            return Err("sso.address must not be empty".to_string());
        }
        if !(1..=MAX_SSO_DURATION_MS).contains(&self.timeout_ms) {
            return Err(format!(
                "sso.timeout_ms must be between 1 and {MAX_SSO_DURATION_MS}"
            ));
        }
        if self.backoff_ms > MAX_SSO_DURATION_MS {
            return Err(format!("sso.backoff_ms must be at most {MAX_SSO_DURATION_MS}"));
        }
        if self.retries_count == 0 {
            return Err("sso.retries_count must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Generated alias configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AliasConfig {
    /// Length of generated aliases.
    #[serde(default = "default_alias_length")]
    pub length: usize,
    /// How many generated candidates to try before giving up.
    #[serde(default = "default_alias_max_attempts")]
    pub max_attempts: u32,
}

fn default_alias_length() -> usize {
    6
}

fn default_alias_max_attempts() -> u32 {
    10
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            length: default_alias_length(),
            max_attempts: default_alias_max_attempts(),
        }
    }
}

impl AliasConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=crate::MAX_ALIAS_LEN).contains(&self.length) {
            return Err(format!(
                "aliases.length must be between 1 and {}",
                crate::MAX_ALIAS_LEN
            ));
        }
        if self.max_attempts == 0 {
            return Err("aliases.max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Full application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Alias store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Credential verification (required).
    pub auth: AuthConfig,
    /// Identity authority client (required).
    pub sso: SsoConfig,
    /// Generated alias settings.
    #[serde(default)]
    pub aliases: AliasConfig,
}

impl AppConfig {
    /// Validate every section, returning the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.auth.validate()?;
        self.sso.validate()?;
        self.aliases.validate()?;
        Ok(())
    }

    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses the in-memory store and a fixed secret.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::Memory,
            auth: AuthConfig {
                app_secret: "test-secret".to_string(),
                clock_skew_secs: default_clock_skew_secs(),
            },
            sso: SsoConfig {
                address: "localhost:44044".to_string(),
                timeout_ms: default_sso_timeout_ms(),
                retries_count: default_sso_retries_count(),
                backoff_ms: default_sso_backoff_ms(),
                app_id: 1,
            },
            aliases: AliasConfig::default(),
        }
    }
}
