//! Best-effort forwarding of transcript text to the relay sink.
//!
//! A send either succeeds (any 2xx) or returns a [`RelayError`] to its
//! caller. Nothing is retried, and relay outcomes never touch ingestion
//! state.
//!
//! ```rust,no_run
//! use voxlink_sdk::RelayClient;
//!
//! # async fn run() -> Result<(), voxlink_sdk::RelayError> {
//! let relay = RelayClient::new("http://localhost:3002/api/relay");
//! let receipt = relay.send_text("Can you hear me?").await?;
//! println!("relay answered {}", receipt.status);
//! # Ok(())
//! # }
//! ```

use tokio::task::JoinHandle;
use tracing::{info, warn};
use voxlink_models::{RelayPayload, Speaker, KIND_MANUAL};

/// Why a send did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Blank text; no request was made.
    #[error("nothing to send: transcript is empty")]
    EmptyTranscript,

    /// The relay answered with a non-2xx status.
    #[error("relay responded with {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// The request never got an answer.
    #[error("relay unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

/// A successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReceipt {
    pub status: u16,
    pub body: String,
}

/// HTTP client for the relay sink. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    url: String,
}

impl RelayClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `payload` as JSON.
    pub async fn forward(&self, payload: &RelayPayload) -> Result<RelayReceipt, RelayError> {
        let res = match self.http.post(&self.url).json(payload).send().await {
            Ok(res) => res,
            Err(e) => {
                warn!(url = %self.url, error = %e, "relay unreachable");
                return Err(e.into());
            }
        };

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            warn!(url = %self.url, %status, "relay rejected payload");
            return Err(RelayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!(speaker = %payload.speaker, kind = %payload.kind, "forwarded to relay");
        Ok(RelayReceipt {
            status: status.as_u16(),
            body,
        })
    }

    /// Relay operator-typed text as the user. Blank text is refused.
    pub async fn send_text(&self, text: &str) -> Result<RelayReceipt, RelayError> {
        if text.trim().is_empty() {
            return Err(RelayError::EmptyTranscript);
        }
        let payload = RelayPayload::builder(text)
            .speaker(Speaker::User)
            .kind(KIND_MANUAL)
            .build();
        self.forward(&payload).await
    }

    /// Fire-and-forget send on a background task.
    ///
    /// The caller may await the handle to learn the outcome, or drop it.
    pub fn forward_detached(
        &self,
        payload: RelayPayload,
    ) -> JoinHandle<Result<RelayReceipt, RelayError>> {
        let client = self.clone();
        tokio::spawn(async move { client.forward(&payload).await })
    }
}
