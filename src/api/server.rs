use std::net::SocketAddr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    services::{conversions, convert, health},
    state::AppState,
};
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All routes with the upload limit and request tracing applied
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes.as_usize();

    Router::new()
        .route("/api/convert", post(convert))
        .route("/api/conversions", get(conversions))
        .route("/health", get(health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

/// Serve the API until SIGINT/SIGTERM. `address` overrides `server.bind_addr`.
pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    let state = AppState::from_config(config);
    let tracker = state.dispatcher.tracker();
    info!(
        uploads = %tracker.upload_root().display(),
        output = %tracker.output_root().display(),
        "Preparing request directories"
    );
    tracker
        .ensure_roots()
        .await
        .map_err(|e| format!("Failed to prepare directories: {}", e))?;

    let app = build_router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "ConvertBox API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
