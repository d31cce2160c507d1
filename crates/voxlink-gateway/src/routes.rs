//! Router for `/api/relay`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::relay::{self, RelayRequest};

/// State shared across handlers.
pub struct AppState {
    pub config: GatewayConfig,
    pub http: reqwest::Client,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/relay", post(relay_payload).fallback(method_not_allowed))
        .layer(cors_layer())
        .with_state(state)
}

/// Any origin may call the relay. Preflight requests are answered by the
/// layer and never reach the handlers.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

/// `POST /api/relay`: enrich the payload and forward it upstream.
async fn relay_payload(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let Json(request) = body.map_err(|e| GatewayError::InvalidBody(e.body_text()))?;
    let payload = request.enrich()?;
    info!(kind = %payload["type"], speaker = %payload["speaker"], "relay request received");

    let upstream =
        relay::forward_upstream(&state.http, &state.config.upstream_url, &payload).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Payload forwarded to relay upstream",
        "upstream_response": upstream,
        "timestamp": relay::now(),
    })))
}

async fn method_not_allowed() -> GatewayError {
    GatewayError::MethodNotAllowed
}
