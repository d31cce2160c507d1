//! Pull transport over HTTP polling.
//!
//! Each subscription polls `GET <endpoint>` at a fixed interval with
//! `Authorization: Bearer <credential>`. The body is a JSON array of raw
//! events queued since the previous poll; each element is forwarded as a
//! [`TransportEvent::Message`].
//!
//! | Situation | Reported as |
//! |-----------|-------------|
//! | first poll succeeds | `Established` |
//! | first poll fails | `Failed`, polling stops |
//! | later poll fails | `Reconnecting(Some(reason))` once, polling continues |
//! | next success after that | `Reconnected` |

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::SdkError;
use crate::transport::{EventSink, HubTransport, SubscriptionHandle, TransportEvent};

/// Default time between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Opens polling subscriptions.
#[derive(Debug, Clone)]
pub struct PollTransport {
    http: reqwest::Client,
    interval: Duration,
}

impl PollTransport {
    pub fn new(interval: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), interval)
    }

    /// Use an existing HTTP client (shared pools, custom timeouts).
    pub fn with_client(http: reqwest::Client, interval: Duration) -> Self {
        Self { http, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for PollTransport {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl HubTransport for PollTransport {
    type Subscription = PollSubscription;

    /// Spawns the polling task; must be called inside a Tokio runtime.
    fn open(&mut self, endpoint: &str, credential: &str, sink: EventSink) -> PollSubscription {
        let task = tokio::spawn(run_poller(
            self.http.clone(),
            endpoint.to_string(),
            credential.to_string(),
            self.interval,
            sink,
        ));
        PollSubscription { task }
    }
}

/// Handle to a running polling task. Closing or dropping it aborts the task.
#[derive(Debug)]
pub struct PollSubscription {
    task: JoinHandle<()>,
}

impl SubscriptionHandle for PollSubscription {
    fn close(self) {
        drop(self);
    }
}

impl Drop for PollSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_poller(
    http: reqwest::Client,
    url: String,
    token: String,
    interval: Duration,
    sink: EventSink,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut established = false;
    let mut degraded = false;

    loop {
        ticker.tick().await;
        match fetch_events(&http, &url, &token).await {
            Ok(events) => {
                if !established {
                    established = true;
                    info!(%url, "poll source established");
                    sink.emit(TransportEvent::Established);
                } else if degraded {
                    degraded = false;
                    info!(%url, "poll source recovered");
                    sink.emit(TransportEvent::Reconnected);
                }
                if !events.is_empty() {
                    debug!(count = events.len(), "polled events");
                }
                for event in events {
                    sink.emit(TransportEvent::Message(event));
                }
            }
            Err(e) if !established => {
                warn!(%url, error = %e, "initial poll failed");
                sink.emit(TransportEvent::Failed(e.to_string()));
                return;
            }
            Err(e) => {
                warn!(%url, error = %e, "poll failed");
                if !degraded {
                    degraded = true;
                    sink.emit(TransportEvent::Reconnecting(Some(e.to_string())));
                }
            }
        }
    }
}

/// Fetch one batch and return every element re-encoded as its own payload.
async fn fetch_events(http: &reqwest::Client, url: &str, token: &str) -> Result<Vec<String>, SdkError> {
    let res = http.get(url).bearer_auth(token).send().await?;
    let status = res.status();
    let body = res.text().await?;
    if !status.is_success() {
        return Err(SdkError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        });
    }
    let batch: Vec<serde_json::Value> = serde_json::from_str(&body)?;
    Ok(batch.iter().map(serde_json::Value::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{IngestError, IngestParams, IngestUpdate, TranscriptIngestor};
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use voxlink_models::{ConnectionStatus, Sender};

    type Batches = Arc<Mutex<VecDeque<Vec<Value>>>>;

    async fn events(
        State(batches): State<Batches>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<Value>>, StatusCode> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if auth != "Bearer poll-token" {
            return Err(StatusCode::UNAUTHORIZED);
        }
        let next = batches.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Json(next))
    }

    async fn serve(batches: Batches) -> String {
        let app = Router::new().route("/events", get(events)).with_state(batches);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/events")
    }

    async fn next(ingestor: &mut TranscriptIngestor<PollTransport>) -> IngestUpdate {
        tokio::time::timeout(Duration::from_secs(5), ingestor.next_update())
            .await
            .expect("no update before timeout")
            .expect("event queue closed")
    }

    #[tokio::test]
    async fn polled_events_become_transcript() {
        let batches: Batches = Arc::new(Mutex::new(VecDeque::from(vec![
            vec![json!({"type": "call.connected"})],
            vec![
                json!({"type": "call.input_audio.transcription.completed",
                       "data": {"timestamp": "2025-06-06T12:00:10Z", "message": "second"}}),
                json!({"type": "call.output_audio.transcription.completed",
                       "data": {"timestamp": "2025-06-06T12:00:00Z", "message": "first"}}),
            ],
        ])));
        let url = serve(batches).await;

        let mut ingestor = TranscriptIngestor::new(PollTransport::new(Duration::from_millis(20)));
        ingestor.configure(IngestParams::new(url, Some("poll-token".into()), true));
        assert_eq!(ingestor.status(), ConnectionStatus::Connecting);

        assert_eq!(
            next(&mut ingestor).await,
            IngestUpdate::Status {
                status: ConnectionStatus::Connected,
                error: None
            }
        );
        assert!(matches!(next(&mut ingestor).await, IngestUpdate::Appended(_)));
        assert!(matches!(next(&mut ingestor).await, IngestUpdate::Appended(_)));

        let messages = ingestor.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text(), "first");
        assert_eq!(messages[0].sender(), Sender::Counterpart);
        assert_eq!(messages[1].text(), "second");
        assert_eq!(messages[1].sender(), Sender::Caller);
    }

    #[tokio::test]
    async fn rejected_credential_fails_connection() {
        let url = serve(Arc::default()).await;

        let mut ingestor = TranscriptIngestor::new(PollTransport::new(Duration::from_millis(20)));
        ingestor.configure(IngestParams::new(url, Some("wrong".into()), true));

        let update = next(&mut ingestor).await;
        let IngestUpdate::Status { status, error } = update else {
            panic!("expected a status update, got {update:?}");
        };
        assert_eq!(status, ConnectionStatus::Disconnected);
        let Some(IngestError::ConnectFailed(reason)) = error else {
            panic!("expected a connect failure, got {error:?}");
        };
        assert!(reason.contains("401"));
    }

    #[tokio::test]
    async fn malformed_batch_body_fails_initial_poll() {
        let app = Router::new().route("/events", get(|| async { "not json" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut ingestor = TranscriptIngestor::new(PollTransport::new(Duration::from_millis(20)));
        ingestor.configure(IngestParams::new(
            format!("http://{addr}/events"),
            Some("t".into()),
            true,
        ));
        next(&mut ingestor).await;
        assert_eq!(ingestor.status(), ConnectionStatus::Disconnected);
        assert!(matches!(ingestor.error(), Some(IngestError::ConnectFailed(_))));
    }
}
