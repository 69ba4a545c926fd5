//! Charm registry server entry point.
//!
//! Initialises tracing, loads configuration from `CHARM_REGISTRY_*`
//! environment variables, builds the store client once, and serves the
//! registry API over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use charm_common::RegistryServerConfig;
use charm_common::config::ENV_PREFIX;
use tracing_subscriber::EnvFilter;

use charm_registry::auth::TokenShapeVerifier;
use charm_registry::server::{AppState, build_app};
use charm_registry::store;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("charm-registry starting");

    let config: RegistryServerConfig = envy::prefixed(ENV_PREFIX)
        .from_env()
        .context("failed to load config from CHARM_REGISTRY_* env vars")?;
    config.validate().context("invalid configuration")?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        store = %config.store,
        public_host = %config.public_host,
        token_policy = %config.token_policy,
        "configuration loaded",
    );

    let store = store::from_config(&config).context("failed to initialise store client")?;

    let state = AppState {
        store,
        verifier: Arc::new(TokenShapeVerifier::new(config.token_policy)),
        public_host: config.public_host.as_str().into(),
        service_name: config.service_name.as_str().into(),
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!("registry ready on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("charm-registry shut down");
    Ok(())
}

/// Wait for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("received shutdown signal");
}
