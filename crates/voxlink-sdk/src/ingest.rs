//! Live transcript ingestion.
//!
//! [`TranscriptIngestor`] owns at most one subscription to a message source
//! and turns the events it delivers into an ordered chat history, together
//! with a [`ConnectionStatus`] and the last ingestion error.
//!
//! # Typical usage
//!
//! ```rust,no_run
//! use voxlink_sdk::{IngestParams, NatsTransport, TranscriptIngestor};
//!
//! # async fn run() {
//! let mut ingestor = TranscriptIngestor::new(NatsTransport::new("default"));
//! ingestor.configure(IngestParams::new(
//!     "nats://localhost:4222",
//!     Some("secret-token".to_string()),
//!     true,
//! ));
//!
//! while let Some(update) = ingestor.next_update().await {
//!     println!("{update:?} -> {} messages", ingestor.messages().len());
//! }
//! # }
//! ```
//!
//! # Concurrency
//!
//! Transports may emit from any task, but events are queued and only
//! applied by whoever drives the ingestor (`next_update` / `drain_pending`),
//! so all state changes happen on one task, one event at a time.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use voxlink_models::{ChatMessage, ConnectionStatus, EventKind, RawEvent, Sender};

use crate::history::History;
use crate::transport::{
    EventSink, HubTransport, SourceEvent, SubscriptionHandle, SubscriptionId, TransportEvent,
};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Activation parameters, checked for presence only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct IngestParams {
    /// Source endpoint (hub URL or poll URL).
    pub endpoint: String,
    /// Authentication credential. An empty string counts as absent.
    pub credential: Option<String>,
    /// Master switch.
    pub enabled: bool,
}

impl IngestParams {
    pub fn new(endpoint: impl Into<String>, credential: Option<String>, enabled: bool) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential,
            enabled,
        }
    }

    /// The credential, if present and non-empty.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref().filter(|c| !c.is_empty())
    }

    /// Whether these parameters call for a live subscription.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.endpoint.is_empty() && self.credential().is_some()
    }
}

impl fmt::Debug for IngestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestParams")
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential().map(|_| "<redacted>"))
            .field("enabled", &self.enabled)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Errors and updates
// ---------------------------------------------------------------------------

/// The ingestion error slot. Last write wins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// Enabled without a credential.
    #[error("Authentication token is missing.")]
    MissingCredential,

    /// The subscription could not be established.
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// The subscription closed abnormally.
    #[error("Connection closed due to error: {0}")]
    ClosedWithError(String),

    /// The transport is reconnecting after an error.
    #[error("Reconnecting due to error: {0}")]
    Reconnecting(String),
}

/// A change visible to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestUpdate {
    /// Status and/or error changed.
    Status {
        status: ConnectionStatus,
        error: Option<IngestError>,
    },
    /// A message joined the history.
    Appended(ChatMessage),
    /// The history was emptied by a disconnect marker.
    Cleared,
}

/// Everything a view needs to render, copied out of the ingestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSnapshot {
    pub status: ConnectionStatus,
    pub error: Option<IngestError>,
    pub messages: Vec<ChatMessage>,
}

// ---------------------------------------------------------------------------
// TranscriptIngestor
// ---------------------------------------------------------------------------

struct ActiveSubscription<S> {
    id: SubscriptionId,
    handle: S,
}

/// Maintains one subscription and the transcript it produces.
pub struct TranscriptIngestor<T: HubTransport> {
    transport: T,
    params: Option<IngestParams>,
    active: Option<ActiveSubscription<T::Subscription>>,
    next_subscription: u64,
    status: ConnectionStatus,
    error: Option<IngestError>,
    history: History,
    events_tx: mpsc::UnboundedSender<SourceEvent>,
    events_rx: mpsc::UnboundedReceiver<SourceEvent>,
}

impl<T: HubTransport> TranscriptIngestor<T> {
    /// Create an idle ingestor. Nothing is opened until [`configure`](Self::configure).
    pub fn new(transport: T) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            params: None,
            active: None,
            next_subscription: 1,
            status: ConnectionStatus::Disconnected,
            error: None,
            history: History::new(),
            events_tx,
            events_rx,
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Apply new activation parameters.
    ///
    /// Identical parameters are a no-op. Otherwise any open subscription is
    /// closed first (status `Disconnected`, history cleared), then the new
    /// parameters are evaluated and, if valid, exactly one subscription is
    /// opened.
    pub fn configure(&mut self, params: IngestParams) {
        if self.params.as_ref() == Some(&params) {
            return;
        }
        self.teardown();
        debug!(?params, "ingestor reconfigured");
        self.params = Some(params);
        self.activate();
    }

    /// Close everything and forget the parameters.
    pub fn shutdown(&mut self) {
        self.teardown();
        self.error = None;
        self.params = None;
    }

    fn activate(&mut self) {
        let Some(params) = &self.params else {
            return;
        };

        if !params.is_active() {
            self.error = if params.enabled && params.credential().is_none() {
                warn!("ingestion enabled without a credential");
                Some(IngestError::MissingCredential)
            } else {
                None
            };
            return;
        }

        let Some(credential) = params.credential() else {
            return;
        };

        let id = SubscriptionId::new(self.next_subscription);
        self.next_subscription += 1;
        self.error = None;
        self.status = ConnectionStatus::Connecting;

        info!(endpoint = %params.endpoint, subscription = %id, "opening subscription");
        let sink = EventSink::new(id, self.events_tx.clone());
        let handle = self.transport.open(&params.endpoint, credential, sink);
        self.active = Some(ActiveSubscription { id, handle });
    }

    fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            info!(subscription = %active.id, "closing subscription");
            active.handle.close();
        }
        self.status = ConnectionStatus::Disconnected;
        self.history.clear();
    }

    // ------------------------------------------------------------------
    // Event handling
    // ------------------------------------------------------------------

    /// Apply one transport event.
    ///
    /// Returns the resulting visible change, or `None` when the event was
    /// stale, unrecognised, or malformed.
    pub fn apply(&mut self, source: SourceEvent) -> Option<IngestUpdate> {
        let current = self.active.as_ref().map(|a| a.id);
        if current != Some(source.subscription) {
            debug!(subscription = %source.subscription, "dropping event from superseded subscription");
            return None;
        }

        match source.event {
            TransportEvent::Established => {
                info!(subscription = %source.subscription, "subscription established");
                Some(self.set_status(ConnectionStatus::Connected))
            }
            TransportEvent::Failed(reason) => {
                warn!(subscription = %source.subscription, %reason, "subscription failed");
                self.error = Some(IngestError::ConnectFailed(reason));
                Some(self.set_status(ConnectionStatus::Disconnected))
            }
            TransportEvent::Closed(reason) => {
                info!(subscription = %source.subscription, ?reason, "subscription closed");
                self.error = reason.map(IngestError::ClosedWithError);
                Some(self.set_status(ConnectionStatus::Disconnected))
            }
            TransportEvent::Reconnecting(reason) => {
                info!(subscription = %source.subscription, ?reason, "subscription reconnecting");
                if let Some(reason) = reason {
                    self.error = Some(IngestError::Reconnecting(reason));
                }
                Some(self.set_status(ConnectionStatus::Connecting))
            }
            TransportEvent::Reconnected => {
                info!(subscription = %source.subscription, "subscription reconnected");
                self.error = None;
                Some(self.set_status(ConnectionStatus::Connected))
            }
            TransportEvent::Message(payload) => self.ingest(&payload),
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) -> IngestUpdate {
        self.status = status;
        IngestUpdate::Status {
            status,
            error: self.error.clone(),
        }
    }

    fn ingest(&mut self, payload: &str) -> Option<IngestUpdate> {
        let event = match RawEvent::parse(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "ignoring malformed message");
                return None;
            }
        };

        let sender = match event.kind() {
            Some(EventKind::CallerTranscript) => Sender::Caller,
            Some(EventKind::CounterpartTranscript) => Sender::Counterpart,
            Some(EventKind::CallDisconnected) => {
                info!(cleared = self.history.len(), "call ended, clearing transcript");
                self.history.clear();
                return Some(IngestUpdate::Cleared);
            }
            Some(EventKind::CallConnected) => {
                debug!("call connected");
                return None;
            }
            None => {
                debug!(event_type = %event.event_type, "ignoring unrecognised event");
                return None;
            }
        };

        let data = match event.transcript() {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, event_type = %event.event_type, "ignoring malformed transcript");
                return None;
            }
        };

        let message = ChatMessage::from_transcript(sender, data);
        debug!(id = %message.id(), %sender, "transcript appended");
        self.history.push(message.clone());
        Some(IngestUpdate::Appended(message))
    }

    /// Apply every queued event without waiting.
    pub fn drain_pending(&mut self) -> Vec<IngestUpdate> {
        let mut updates = Vec::new();
        while let Ok(source) = self.events_rx.try_recv() {
            if let Some(update) = self.apply(source) {
                updates.push(update);
            }
        }
        updates
    }

    /// Wait for the next visible change.
    ///
    /// Waits indefinitely while no subscription is open.
    pub async fn next_update(&mut self) -> Option<IngestUpdate> {
        loop {
            let source = self.events_rx.recv().await?;
            if let Some(update) = self.apply(source) {
                return Some(update);
            }
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Messages ordered by timestamp, ties in arrival order.
    pub fn messages(&self) -> &[ChatMessage] {
        self.history.visible()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// The current error, if any.
    pub fn error(&self) -> Option<&IngestError> {
        self.error.as_ref()
    }

    /// Parameters last passed to [`configure`](Self::configure).
    pub fn params(&self) -> Option<&IngestParams> {
        self.params.as_ref()
    }

    /// Whether a subscription is currently held open.
    pub fn has_subscription(&self) -> bool {
        self.active.is_some()
    }

    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            status: self.status,
            error: self.error.clone(),
            messages: self.history.visible().to_vec(),
        }
    }

    /// The transport, e.g. to inspect a test double.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: HubTransport> Drop for TranscriptIngestor<T> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(subscription = %active.id, "ingestor dropped, closing subscription");
            active.handle.close();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
