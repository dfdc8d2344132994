//! Route configuration.

use crate::auth::trace_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Paths that can never be used as aliases.
pub const RESERVED_PATHS: &[&str] = &["url", "register", "login", "health", "metrics"];

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Health check (intentionally unauthenticated for load balancers/k8s probes)
        .route("/health", get(handlers::health_check))
        .route("/url", post(handlers::save_alias))
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login));

    // When enabled, this endpoint should be network-restricted to the scraper.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .route(
            "/{alias}",
            get(handlers::resolve_alias).delete(handlers::delete_alias),
        )
        .layer(middleware::from_fn(trace_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
