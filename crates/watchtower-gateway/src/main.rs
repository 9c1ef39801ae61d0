//! Watchtower gateway
//!
//! - REST: `/`, `/health`, `/metrics`, `/api/services`, `/api/alerts`,
//!   `/api/simulate-incident`
//! - WebSocket: `/ws/alerts` (heartbeats + broadcast incidents)
//!
//! Config path comes from `WATCHTOWER_CONFIG` (default `watchtower.yaml`);
//! a missing file means defaults.

use watchtower_gateway::{app_state, config, obs, router};

const CONFIG_ENV: &str = "WATCHTOWER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "watchtower.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let (cfg, from_file) = config::load_or_default(&path)?;

    obs::logging::init(&cfg.log)?;
    if from_file {
        tracing::info!(%path, "config loaded");
    } else {
        tracing::info!(%path, "config file not found, using defaults");
    }

    let listen = cfg.server.listen_addr()?;
    let state = app_state::AppState::new(cfg)?;
    let connections = state.connections();
    let app = router::build_router(state)?;

    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(address = %listener.local_addr()?, "watchtower-gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let closed = connections.close_all();
            tracing::info!(closed, "alert streams closed");
        })
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C. If the handler cannot be installed, run until killed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}
