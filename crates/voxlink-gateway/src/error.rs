//! Error types for the relay gateway.
//!
//! [`GatewayError`] implements [`IntoResponse`] so handlers can return
//! `Result<…, GatewayError>` directly. Each variant maps to the status code
//! and a JSON body with `error` and `message` fields.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::relay::now;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Neither `transcript` nor `type` was given.
    #[error("Either transcript or type is required")]
    MissingFields,

    /// The body was not a JSON object of the expected shape.
    #[error("{0}")]
    InvalidBody(String),

    /// Anything but `POST` / `OPTIONS`.
    #[error("This endpoint only accepts POST requests")]
    MethodNotAllowed,

    /// The upstream answered with a non-2xx status.
    #[error("relay upstream error: {status} - {body}")]
    UpstreamStatus { status: u16, body: String },

    /// The upstream could not be reached.
    #[error("relay upstream unreachable: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match &self {
            Self::MissingFields => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Missing required fields", "message": message }),
            ),
            Self::InvalidBody(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid request body", "message": message }),
            ),
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed", "message": message }),
            ),
            Self::UpstreamStatus { .. } | Self::Upstream(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "success": false,
                    "error": "Failed to reach relay upstream",
                    "message": message,
                    "timestamp": now(),
                }),
            ),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "relay request failed");
        } else {
            tracing::warn!(%status, error = %message, "relay request rejected");
        }
        (status, Json(body)).into_response()
    }
}
