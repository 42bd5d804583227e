//! HTTP gateway for the dashboard.
//!
//! - `POST /api/panel`   → fleet operations proxy
//! - `POST /api/install` → provisioning orchestrator (shared-secret gated)
//! - `GET  /health`      → liveness probe

pub mod error;
pub mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::application::ports::{ControlPlaneConnector, RemoteShell};
use crate::domain::{FleetPolicy, InstallKey, InstallPlan, InstallProfile};

/// Shared, read-only state behind every request.
pub struct AppState {
    pub connector: Arc<dyn ControlPlaneConnector>,
    pub shell: Arc<dyn RemoteShell>,
    pub policy: FleetPolicy,
    pub plan: InstallPlan,
    pub profile: InstallProfile,
    pub install_key: InstallKey,
}

/// Compose the gateway router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/panel",
            post(handlers::panel).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/install",
            post(handlers::install).fallback(handlers::method_not_allowed),
        )
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `listen_addr` and serve until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(state: Arc<AppState>, listen_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    let bound = listener
        .local_addr()
        .map_or_else(|_| listen_addr.to_string(), |addr| addr.to_string());
    tracing::info!("gateway ready at http://{bound}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("gateway shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
///
/// A handler that cannot be installed never fires; the other one still can.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        () = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
