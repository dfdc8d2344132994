//! Application state shared across handlers.

use crate::auth::CredentialVerifier;
use crate::pipeline::RequestPipeline;
use shortlink_core::config::AppConfig;
use shortlink_sso::SsoClient;
use shortlink_store::{AliasSaver, AliasStore};
use std::sync::Arc;
use tokio::time::Instant;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Alias operations.
    pub pipeline: RequestPipeline,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn AliasStore>,
        verifier: Arc<dyn CredentialVerifier>,
        sso: SsoClient,
    ) -> Self {
        let saver = AliasSaver::from_config(&config.aliases);
        Self {
            config: Arc::new(config),
            pipeline: RequestPipeline::new(store, verifier, sso, saver),
        }
    }

    /// Deadline for a request starting now. `None` when the budget does not
    /// fit in an `Instant`; the retry policy still bounds such requests.
    pub fn deadline(&self) -> Option<Instant> {
        Instant::now().checked_add(self.config.server.request_timeout())
    }
}
