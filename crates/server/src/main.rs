//! shortlink server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use shortlink_core::config::AppConfig;
use shortlink_server::{AppState, JwtVerifier, create_router};
use shortlink_sso::SsoClient;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const ENV_PREFIX: &str = "SHORTLINK_";
const CONFIG_ENV: &str = "SHORTLINK_CONFIG";

/// shortlink - An authenticated URL shortener
#[derive(Parser, Debug)]
#[command(name = "shortlinkd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SHORTLINK_CONFIG",
        default_value = "config/shortlink.toml"
    )]
    config: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, env = "SHORTLINK_LOG_JSON")]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into());
    let (json_layer, text_layer) = if json {
        (Some(fmt::layer().json()), None)
    } else {
        (None, Some(fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

/// Load configuration from an optional TOML file overlaid with `SHORTLINK_` env vars.
fn load_config(path: &Path) -> Result<AppConfig> {
    let mut figment = Figment::new();
    let has_config_file = path.exists();

    if has_config_file {
        tracing::info!(config_path = %path.display(), "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {}", path.display());
    }

    let has_env_config = std::env::vars()
        .any(|(key, _)| key.starts_with(ENV_PREFIX) && key != CONFIG_ENV && key != "SHORTLINK_LOG_JSON");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: shortlinkd --config /path/to/shortlink.toml\n  \
             2. Environment variables: SHORTLINK_AUTH__APP_SECRET=... \
             SHORTLINK_SSO__ADDRESS=localhost:44044 SHORTLINK_SSO__APP_ID=1 shortlinkd\n\n\
             See config/shortlink.example.toml for example configuration.\n\
             Set SHORTLINK_CONFIG env var to specify a default config file path."
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    tracing::info!("shortlink v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(Path::new(&args.config))?;

    shortlink_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    let store = shortlink_store::from_config(&config.store)
        .await
        .context("failed to initialize alias store")?;
    store
        .health_check()
        .await
        .context("alias store health check failed")?;
    tracing::info!("Alias store initialized");

    let verifier = Arc::new(JwtVerifier::from_config(&config.auth));

    // The channel connects lazily, so an unreachable authority only affects
    // the requests that need it.
    let sso = SsoClient::from_config(&config.sso).context("failed to configure sso client")?;

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    let state = AppState::new(config, store, verifier, sso);
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
