#![deny(missing_docs)]

//! # VoxLink Models
//!
//! Core data types for live voice-call transcripts.
//!
//! ## Data flow
//!
//! ```text
//! hub payload (JSON)
//! └── RawEvent { type, data: EventData }
//!     ├── EventKind::CallerTranscript      → ChatMessage { sender: Caller }
//!     ├── EventKind::CounterpartTranscript → ChatMessage { sender: Counterpart }
//!     ├── EventKind::CallDisconnected      → history cleared
//!     └── EventKind::CallConnected / other → ignored
//!
//! ChatMessage ──► RelayPayload { transcript, speaker, type, confidence, timestamp }
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`event`] | Inbound wire shape (`RawEvent`, `EventData`) and the recognised tags (`EventKind`) |
//! | [`message`] | Normalised chat messages (`ChatMessage`, `Sender`, `MessageId`, `TimestampKey`) |
//! | [`status`] | Subscription lifecycle (`ConnectionStatus`) |
//! | [`relay`] | Outbound relay body (`RelayPayload`, `Speaker`) and its builder |
//! | [`error`] | `ModelError` |

pub mod error;
pub mod event;
pub mod message;
pub mod relay;
pub mod status;

// Re-export all public types at crate root for convenience.
pub use error::*;
pub use event::*;
pub use message::*;
pub use relay::*;
pub use status::*;
