//! VoxLink relay gateway: accepts transcript payloads from browsers and
//! tools, fills in defaults, and forwards them to the relay worker.
//!
//! `POST /api/relay` takes `{transcript?, speaker?, type?, confidence?, …}`.
//! At least one of `transcript` or `type` must be set; any extra fields are
//! passed through untouched.

mod config;
mod error;
mod relay;
mod routes;

use std::sync::Arc;

use tracing::info;

use crate::config::GatewayConfig;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env();
    info!(upstream = %config.upstream_url, "relay upstream configured");

    let listen_port = config.listen_port;
    let state = Arc::new(AppState {
        config,
        http: reqwest::Client::new(),
    });
    let app = routes::router(state);

    let addr = format!("0.0.0.0:{listen_port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(address = %addr, "relay gateway listening");
    axum::serve(listener, app).await
}
