//! Liveness HTTP endpoint
//!
//! Hosting platforms probe an HTTP port to decide whether the process
//! is alive. The bot itself only long-polls Telegram, so this tiny
//! server is the only thing listening.

use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tracing::info;

async fn root() -> &'static str {
    "Media Relay Bot is running!"
}

async fn health() -> &'static str {
    "OK"
}

/// Builds the probe router
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

/// Serves the probe router until the process exits
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn serve(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Health endpoint listening on {addr}");
    axum::serve(listener, router()).await?;
    Ok(())
}
