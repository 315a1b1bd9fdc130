mod app_error;
mod dashboard;
mod handlers;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};

use crate::{
    config::Config,
    server::handlers::{clear, health, index, list_webhooks, receive_webhook, status},
    storage::{RingBufferStore, WebhookStore},
};

/// Shared application state.
struct AppState {
    store: Arc<dyn WebhookStore + Send + Sync + 'static>,
    /// Public URL of the receive endpoint, shown on the dashboard.
    webhook_url: String,
}

/// Creates a new server with an empty in-memory store. Used for testing, too.
pub fn make_server(config: &Config) -> Router {
    let store = Arc::new(RingBufferStore::new(config.capacity));
    let shared_state = Arc::new(AppState {
        store,
        webhook_url: format!("http://localhost:{}/webhook", config.port),
    });
    Router::new()
        .route("/", get(index))
        .route("/webhook", post(receive_webhook))
        .route("/webhooks", get(list_webhooks))
        .route("/status", get(status))
        .route("/clear", post(clear))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(shared_state)
}

/// Starts the server and runs until Ctrl+C or SIGTERM.
pub async fn serve(config: Config) -> Result<()> {
    let app = make_server(&config);
    let addr = SocketAddr::new(config.host, config.port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!(
        capacity = config.capacity.get(),
        "Listening on http://{addr}, webhook endpoint at http://localhost:{}/webhook",
        config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| "Failed to start server")?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
