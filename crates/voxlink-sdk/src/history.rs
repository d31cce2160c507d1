//! Transcript history.
//!
//! Messages are kept ordered by [`TimestampKey`], with equal keys in arrival
//! order. Each timestamp is parsed once, when its message arrives, and the
//! message is inserted after every entry whose key is not greater.

use voxlink_models::{ChatMessage, TimestampKey};

/// Display-ordered messages with their parsed sort keys.
#[derive(Debug, Clone, Default)]
pub struct History {
    keys: Vec<TimestampKey>,
    visible: Vec<ChatMessage>,
}

impl History {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message at its display position.
    pub fn push(&mut self, message: ChatMessage) {
        let key = message.sort_key();
        let at = self.keys.partition_point(|k| *k <= key);
        self.keys.insert(at, key);
        self.visible.insert(at, message);
    }

    /// Drop every message.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.visible.clear();
    }

    /// Messages ordered by timestamp, ties in arrival order.
    pub fn visible(&self) -> &[ChatMessage] {
        &self.visible
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}
