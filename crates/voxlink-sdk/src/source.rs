//! Runtime choice between the push and pull transports.

use std::time::Duration;

use crate::nats::{NatsSubscription, NatsTransport};
use crate::poll::{PollSubscription, PollTransport};
use crate::transport::{EventSink, HubTransport, SubscriptionHandle};

/// How transcript events are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    /// Push: subscribe on the NATS hub.
    #[default]
    Nats,
    /// Pull: poll an HTTP endpoint.
    Poll,
}

/// Either transport, selected at runtime.
#[derive(Debug, Clone)]
pub enum SourceTransport {
    Nats(NatsTransport),
    Poll(PollTransport),
}

impl SourceTransport {
    /// Build the transport for `kind`. `channel` applies to NATS,
    /// `poll_interval` to polling.
    pub fn new(kind: SourceKind, channel: &str, poll_interval: Duration) -> Self {
        match kind {
            SourceKind::Nats => Self::Nats(NatsTransport::new(channel)),
            SourceKind::Poll => Self::Poll(PollTransport::new(poll_interval)),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Nats(_) => SourceKind::Nats,
            Self::Poll(_) => SourceKind::Poll,
        }
    }
}

/// Subscription opened by a [`SourceTransport`].
#[derive(Debug)]
pub enum SourceSubscription {
    Nats(NatsSubscription),
    Poll(PollSubscription),
}

impl HubTransport for SourceTransport {
    type Subscription = SourceSubscription;

    fn open(&mut self, endpoint: &str, credential: &str, sink: EventSink) -> SourceSubscription {
        match self {
            Self::Nats(t) => SourceSubscription::Nats(t.open(endpoint, credential, sink)),
            Self::Poll(t) => SourceSubscription::Poll(t.open(endpoint, credential, sink)),
        }
    }
}

impl SubscriptionHandle for SourceSubscription {
    fn close(self) {
        match self {
            Self::Nats(s) => s.close(),
            Self::Poll(s) => s.close(),
        }
    }
}
