//! # VoxLink SDK
//!
//! Live call transcript ingestion and relay forwarding.
//!
//! The SDK provides:
//!
//! * [`TranscriptIngestor`]: owns one subscription to a message source and
//!   maintains the ordered transcript, connection status and last error.
//! * [`HubTransport`] / [`SubscriptionHandle`]: the seam between the
//!   ingestor and a concrete source, with two implementations:
//!   [`NatsTransport`] (push) and [`PollTransport`] (HTTP polling).
//! * [`RelayClient`]: best-effort POST of transcript text to a relay sink.
//! * [`HubSubjects`]: canonical NATS subject names.
//!
//! Wire and domain types from [`voxlink_models`] are re-exported for
//! convenience.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voxlink_sdk::{IngestParams, IngestUpdate, NatsTransport, RelayClient, RelayPayload, TranscriptIngestor};
//!
//! # async fn run() {
//! let relay = RelayClient::new("http://localhost:3002/api/relay");
//! let mut ingestor = TranscriptIngestor::new(NatsTransport::new("default"));
//! ingestor.configure(IngestParams::new("nats://localhost:4222", Some("token".into()), true));
//!
//! while let Some(update) = ingestor.next_update().await {
//!     if let IngestUpdate::Appended(message) = update {
//!         relay.forward_detached(RelayPayload::from_message(&message));
//!     }
//! }
//! # }
//! ```

pub mod error;
pub mod history;
pub mod ingest;
pub mod nats;
pub mod poll;
pub mod relay;
pub mod source;
pub mod subjects;
pub mod transport;

pub use error::SdkError;
pub use history::History;
pub use ingest::{IngestError, IngestParams, IngestSnapshot, IngestUpdate, TranscriptIngestor};
pub use nats::{NatsSubscription, NatsTransport};
pub use poll::{PollSubscription, PollTransport, DEFAULT_POLL_INTERVAL};
pub use relay::{RelayClient, RelayError, RelayReceipt};
pub use source::{SourceKind, SourceSubscription, SourceTransport};
pub use subjects::HubSubjects;
pub use transport::{
    EventSink, HubTransport, SourceEvent, SubscriptionHandle, SubscriptionId, TransportEvent,
};

// Re-export model types for ergonomic usage.
pub use voxlink_models::{
    ChatMessage, ConnectionStatus, EventKind, RawEvent, RelayPayload, Sender, Speaker,
};
