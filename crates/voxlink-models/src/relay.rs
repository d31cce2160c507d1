//! # Relay payload
//!
//! Body POSTed to the forwarding sink, plus a fluent builder.
//!
//! ```rust
//! use voxlink_models::{RelayPayload, Speaker};
//!
//! let payload = RelayPayload::builder("hello there")
//!     .speaker(Speaker::Ai)
//!     .kind("hub-forward")
//!     .confidence(0.8)
//!     .build();
//!
//! assert_eq!(payload.speaker, Speaker::Ai);
//! assert_eq!(payload.kind, "hub-forward");
//! ```

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{ChatMessage, Sender};

/// Confidence reported when the producer supplies none.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// `type` used when nothing more specific applies.
pub const KIND_TRANSCRIPT: &str = "transcript";

/// `type` for messages forwarded automatically from the hub.
pub const KIND_HUB_FORWARD: &str = "hub-forward";

/// `type` for text typed by the operator.
pub const KIND_MANUAL: &str = "manual";

// ---------------------------------------------------------------------------
// Speaker
// ---------------------------------------------------------------------------

/// Speaker label understood by the relay.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Speaker {
    /// The human on the call.
    User,
    /// The voice assistant.
    Ai,
}

impl From<Sender> for Speaker {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::Caller => Speaker::User,
            Sender::Counterpart => Speaker::Ai,
        }
    }
}

// ---------------------------------------------------------------------------
// RelayPayload
// ---------------------------------------------------------------------------

/// JSON body sent to the relay.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RelayPayload {
    /// Text being relayed.
    pub transcript: String,
    /// Who said it.
    pub speaker: Speaker,
    /// Free-form category tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Recogniser confidence in `[0, 1]`.
    pub confidence: f64,
    /// When the payload was produced (RFC 3339, UTC).
    pub timestamp: String,
}

impl RelayPayload {
    /// Start building a payload for `transcript`.
    pub fn builder(transcript: impl Into<String>) -> RelayPayloadBuilder {
        RelayPayloadBuilder::new(transcript)
    }

    /// Payload for a hub message being forwarded automatically.
    pub fn from_message(message: &ChatMessage) -> Self {
        Self::builder(message.text())
            .speaker(message.sender().into())
            .kind(KIND_HUB_FORWARD)
            .build()
    }
}

/// Builder for [`RelayPayload`].
///
/// Created via [`RelayPayload::builder`].
pub struct RelayPayloadBuilder {
    transcript: String,
    speaker: Speaker,
    kind: String,
    confidence: f64,
    timestamp: Option<String>,
}

impl RelayPayloadBuilder {
    fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            speaker: Speaker::User,
            kind: KIND_TRANSCRIPT.to_string(),
            confidence: DEFAULT_CONFIDENCE,
            timestamp: None,
        }
    }

    /// Set the speaker (default `user`).
    pub fn speaker(mut self, speaker: Speaker) -> Self {
        self.speaker = speaker;
        self
    }

    /// Set the `type` tag (default `transcript`).
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the confidence, clamped to `[0, 1]`. NaN keeps the default.
    pub fn confidence(mut self, confidence: f64) -> Self {
        if !confidence.is_nan() {
            self.confidence = confidence.clamp(0.0, 1.0);
        }
        self
    }

    /// Override the timestamp (default: time of [`build`](Self::build)).
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Finish the payload.
    pub fn build(self) -> RelayPayload {
        RelayPayload {
            transcript: self.transcript,
            speaker: self.speaker,
            kind: self.kind,
            confidence: self.confidence,
            timestamp: self
                .timestamp
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let payload = RelayPayload::builder("hi").build();
        assert_eq!(payload.transcript, "hi");
        assert_eq!(payload.speaker, Speaker::User);
        assert_eq!(payload.kind, KIND_TRANSCRIPT);
        assert!((payload.confidence - DEFAULT_CONFIDENCE).abs() < f64::EPSILON);
        assert!(chrono::DateTime::parse_from_rfc3339(&payload.timestamp).is_ok());
        assert!(payload.timestamp.ends_with('Z'));
    }

    #[test]
    fn confidence_is_clamped() {
        assert!((RelayPayload::builder("x").confidence(1.7).build().confidence - 1.0).abs() < f64::EPSILON);
        assert!(RelayPayload::builder("x").confidence(-0.2).build().confidence.abs() < f64::EPSILON);
        assert!(
            (RelayPayload::builder("x").confidence(f64::NAN).build().confidence - DEFAULT_CONFIDENCE)
                .abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn speaker_follows_sender() {
        assert_eq!(Speaker::from(Sender::Caller), Speaker::User);
        assert_eq!(Speaker::from(Sender::Counterpart), Speaker::Ai);
    }

    #[test]
    fn forwarded_message_payload() {
        let message = ChatMessage::new(Sender::Counterpart, "2025-06-06T12:00:05Z", "Okay.");
        let payload = RelayPayload::from_message(&message);
        assert_eq!(payload.transcript, "Okay.");
        assert_eq!(payload.speaker, Speaker::Ai);
        assert_eq!(payload.kind, KIND_HUB_FORWARD);
    }

    #[test]
    fn wire_shape() {
        let payload = RelayPayload::builder("hello")
            .speaker(Speaker::Ai)
            .timestamp("2025-06-06T12:00:00.000Z")
            .build();
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "transcript": "hello",
                "speaker": "ai",
                "type": "transcript",
                "confidence": 0.95,
                "timestamp": "2025-06-06T12:00:00.000Z"
            })
        );
    }
}
