//! Inbound hub events.
//!
//! Every payload delivered by the hub is a JSON object of the form
//!
//! ```json
//! { "type": "call.input_audio.transcription.completed",
//!   "data": { "timestamp": "2025-06-06T12:00:00Z", "message": "hello" } }
//! ```
//!
//! The `type` tag is matched against the four [`EventKind`] tags. Anything
//! else is a valid event that simply carries no meaning for the transcript.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// The event tags recognised on the hub.
///
/// | Kind | Tag |
/// |------|-----|
/// | `CallConnected` | `call.connected` |
/// | `CallDisconnected` | `call.disconnected` |
/// | `CallerTranscript` | `call.input_audio.transcription.completed` |
/// | `CounterpartTranscript` | `call.output_audio.transcription.completed` |
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
pub enum EventKind {
    /// The call was set up.
    #[strum(serialize = "call.connected")]
    CallConnected,
    /// The call ended; the transcript is reset.
    #[strum(serialize = "call.disconnected")]
    CallDisconnected,
    /// A finished transcription of the caller's audio.
    #[strum(serialize = "call.input_audio.transcription.completed")]
    CallerTranscript,
    /// A finished transcription of the counterpart's (assistant's) audio.
    #[strum(serialize = "call.output_audio.transcription.completed")]
    CounterpartTranscript,
}

impl EventKind {
    /// Look up the kind for a wire tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        tag.parse().ok()
    }

    /// The wire tag for this kind.
    pub fn tag(self) -> &'static str {
        self.into()
    }
}

// ---------------------------------------------------------------------------
// RawEvent
// ---------------------------------------------------------------------------

/// Body of a transcript event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventData {
    /// ISO-8601 timestamp assigned by the producer.
    pub timestamp: String,
    /// Transcribed text.
    pub message: String,
}

/// An event exactly as received from the hub.
///
/// `data` is optional because connect/disconnect markers may omit it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// The event tag.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Payload for transcript events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EventData>,
}

impl RawEvent {
    /// Build an event of a recognised kind.
    pub fn new(kind: EventKind, timestamp: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            event_type: kind.tag().to_string(),
            data: Some(EventData {
                timestamp: timestamp.into(),
                message: message.into(),
            }),
        }
    }

    /// Build a marker event (no data).
    pub fn marker(kind: EventKind) -> Self {
        Self {
            event_type: kind.tag().to_string(),
            data: None,
        }
    }

    /// Decode a hub payload.
    pub fn parse(payload: &str) -> Result<Self, ModelError> {
        serde_json::from_str(payload).map_err(|e| ModelError::MalformedEvent(e.to_string()))
    }

    /// The recognised kind of this event, if any.
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::from_tag(&self.event_type)
    }

    /// The transcript body, required for transcript kinds.
    pub fn transcript(&self) -> Result<&EventData, ModelError> {
        self.data.as_ref().ok_or_else(|| ModelError::MissingField {
            field: "data".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
