//! Server test utilities.

use super::sso::{StubAuthApi, mint_token};
use shortlink_core::config::AppConfig;
use shortlink_server::{AppState, JwtVerifier, create_router};
use shortlink_sso::{RetryPolicy, SsoClient};
use shortlink_store::{AliasStore, SqliteStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub sso: Arc<StubAuthApi>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server backed by a temporary SQLite store.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let mut config = AppConfig::for_testing();
        // Keep retry pacing short so failure paths finish quickly.
        config.sso.timeout_ms = 500;
        config.sso.backoff_ms = 1;
        modifier(&mut config);

        let store: Arc<dyn AliasStore> = Arc::new(
            SqliteStore::new(temp_dir.path().join("shortlink.db"), Duration::from_secs(5))
                .await
                .expect("Failed to create alias store"),
        );

        let sso_api = Arc::new(StubAuthApi::new(&config.auth.app_secret));
        let sso = SsoClient::new(
            sso_api.clone(),
            RetryPolicy::from_config(&config.sso),
            config.sso.app_id,
        );
        let verifier = Arc::new(JwtVerifier::from_config(&config.auth));

        shortlink_server::metrics::register_metrics();

        let state = AppState::new(config, store, verifier, sso);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            sso: sso_api,
            _temp_dir: temp_dir,
        }
    }

    /// A valid credential for `uid`.
    pub fn token_for(&self, uid: i64) -> String {
        mint_token(&self.state.config.auth.app_secret, uid, 3600)
    }

    /// A credential for `uid` that expired well outside the clock skew window.
    pub fn expired_token(&self, uid: i64) -> String {
        mint_token(&self.state.config.auth.app_secret, uid, -3600)
    }

    /// A valid credential for a user the authority reports as admin.
    pub fn admin_token(&self) -> String {
        self.sso.grant_admin(1);
        self.token_for(1)
    }
}
