//! Normalised chat messages.
//!
//! A [`ChatMessage`] is created once per accepted transcript event and never
//! modified afterwards. Display order is by timestamp, using
//! [`TimestampKey`] so that any two timestamps compare deterministically.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::EventData;

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// Which side of the call produced a message.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sender {
    /// The person who placed the call.
    Caller,
    /// The other party (the voice assistant).
    Counterpart,
}

// ---------------------------------------------------------------------------
// MessageId
// ---------------------------------------------------------------------------

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Opaque, process-unique message identifier.
///
/// Format: `<unix millis>-<sequence>-<8 random hex chars>`. The sequence
/// alone rules out collisions inside one process; the random suffix keeps
/// ids from separate processes apart.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("{millis}-{seq}-{}", &random[..8]))
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// TimestampKey
// ---------------------------------------------------------------------------

/// Offsetless date-time layouts, tried after the offset-carrying ones.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Total-order sort key derived from a message timestamp.
///
/// Parseable timestamps compare chronologically and sort before unparseable
/// ones, which compare as plain strings. Accepted forms are RFC 3339, ISO-8601
/// date-times with minute precision (with an offset, a `Z`, or neither) and
/// bare dates. A missing offset is read as UTC and a bare date as midnight UTC.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimestampKey {
    /// A timestamp that could be read as an instant.
    Instant(DateTime<Utc>),
    /// Anything else, kept verbatim.
    Unparsed(String),
}

impl TimestampKey {
    /// Derive the key for a timestamp string.
    pub fn parse(timestamp: &str) -> Self {
        if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
            return Self::Instant(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M%:z") {
            return Self::Instant(dt.with_timezone(&Utc));
        }
        let utc = timestamp.strip_suffix(['Z', 'z']).unwrap_or(timestamp);
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(utc, format) {
                return Self::Instant(naive.and_utc());
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(timestamp, "%Y-%m-%d") {
            return Self::Instant(date.and_time(NaiveTime::MIN).and_utc());
        }
        Self::Unparsed(timestamp.to_string())
    }
}

// ---------------------------------------------------------------------------
// ChatMessage
// ---------------------------------------------------------------------------

/// One transcript line as shown to the user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    id: MessageId,
    sender: Sender,
    timestamp: String,
    text: String,
}

impl ChatMessage {
    /// Create a message with a freshly generated id.
    pub fn new(sender: Sender, timestamp: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            sender,
            timestamp: timestamp.into(),
            text: text.into(),
        }
    }

    /// Create a message from a transcript event body.
    pub fn from_transcript(sender: Sender, data: &EventData) -> Self {
        Self::new(sender, data.timestamp.clone(), data.message.clone())
    }

    /// Unique id.
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Who spoke.
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Producer-assigned timestamp, verbatim.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Transcribed text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Key used to order messages for display.
    pub fn sort_key(&self) -> TimestampKey {
        TimestampKey::parse(&self.timestamp)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
