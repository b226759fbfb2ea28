//! HTTP request handler
//!
//! Routes:
//! - `POST /api/chat`: answer one conversation turn
//! - `GET /api/personas`: list the cast
//! - `GET /healthz`: collaborator health

mod handlers;

pub use handlers::*;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::llm::SharedBackend;
use crate::orchestrator::Orchestrator;

/// Build the router over a shared orchestrator
pub fn app(state: SharedState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/personas", get(personas))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(config: &AppConfig, backend: SharedBackend) -> Result<()> {
    let addr = config.bind_addr()?;
    let orchestrator = Orchestrator::new(backend, &config.routing)?;
    let backend_name = orchestrator.backend().name();

    let listener = TcpListener::bind(addr).await.map_err(|e| Error::ServerBind {
        addr: addr.to_string(),
        source: e,
    })?;
    let local = listener.local_addr()?;

    info!(addr = %local, backend = backend_name, "Chorus router listening");

    axum::serve(listener, app(Arc::new(orchestrator)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down..."),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}
