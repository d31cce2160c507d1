//! Subscription abstraction over a message source.
//!
//! The ingestor never talks to a wire protocol directly. A
//! [`HubTransport`] opens one subscription per activation and reports its
//! lifecycle and payloads through an [`EventSink`]. Every event is tagged
//! with the [`SubscriptionId`] it was opened under so the ingestor can drop
//! anything that arrives after the subscription was superseded.
//!
//! Handshake, authentication and reconnection belong to the transport; the
//! ingestor only reacts to the callbacks below.

use std::fmt;

use tokio::sync::mpsc;
use tracing::trace;

/// Identifies one opened subscription within an ingestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Lifecycle callbacks and payloads reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The subscription is live.
    Established,
    /// The subscription could not be established at all.
    Failed(String),
    /// The subscription ended, with the reason when it was abnormal.
    Closed(Option<String>),
    /// The link dropped and the transport is re-establishing it.
    Reconnecting(Option<String>),
    /// The link is back after a [`Reconnecting`](Self::Reconnecting).
    Reconnected,
    /// A raw payload, not yet parsed.
    Message(String),
}

/// A [`TransportEvent`] tagged with the subscription that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEvent {
    /// Originating subscription.
    pub subscription: SubscriptionId,
    /// What happened.
    pub event: TransportEvent,
}

/// Delivery handle given to a transport when a subscription is opened.
///
/// Cheap to clone. Emitting never blocks; once the owning ingestor is gone
/// events are discarded.
#[derive(Debug, Clone)]
pub struct EventSink {
    subscription: SubscriptionId,
    tx: mpsc::UnboundedSender<SourceEvent>,
}

impl EventSink {
    /// Bind a sink to a subscription and a delivery queue.
    pub fn new(subscription: SubscriptionId, tx: mpsc::UnboundedSender<SourceEvent>) -> Self {
        Self { subscription, tx }
    }

    /// The subscription this sink reports for.
    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Report an event.
    pub fn emit(&self, event: TransportEvent) {
        let source = SourceEvent {
            subscription: self.subscription,
            event,
        };
        if self.tx.send(source).is_err() {
            trace!(subscription = %self.subscription, "ingestor gone, event discarded");
        }
    }
}

/// Something that can open subscriptions to a message source.
pub trait HubTransport {
    /// Handle to one open subscription.
    type Subscription: SubscriptionHandle;

    /// Open a subscription to `endpoint`, authenticated with `credential`.
    ///
    /// Must return immediately; establishment is reported later through
    /// `sink` as [`TransportEvent::Established`] or
    /// [`TransportEvent::Failed`].
    fn open(&mut self, endpoint: &str, credential: &str, sink: EventSink) -> Self::Subscription;
}

/// An open subscription.
///
/// `close` consumes the handle, so a subscription can only be closed once.
/// Dropping a handle must release the underlying resource as well.
pub trait SubscriptionHandle {
    /// Stop the subscription. Fire-and-forget.
    fn close(self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_tags_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(SubscriptionId::new(7), tx);
        sink.emit(TransportEvent::Established);
        sink.clone().emit(TransportEvent::Message("{}".into()));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.subscription, SubscriptionId::new(7));
        assert_eq!(first.event, TransportEvent::Established);
        let second = rx.try_recv().unwrap();
        assert_eq!(second.event, TransportEvent::Message("{}".into()));
    }

    #[test]
    fn emit_after_receiver_dropped_is_silent() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sink = EventSink::new(SubscriptionId::new(1), tx);
        sink.emit(TransportEvent::Closed(None));
    }

    #[test]
    fn subscription_id_display() {
        assert_eq!(SubscriptionId::new(3).to_string(), "sub-3");
    }
}
