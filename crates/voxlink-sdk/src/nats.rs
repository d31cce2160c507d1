//! Push transport over NATS.
//!
//! Each subscription runs as its own task: connect with the credential as a
//! NATS token, subscribe to the channel subject, forward every payload.
//! Reconnection is handled by `async-nats` itself; its client events are
//! only translated into [`TransportEvent`]s.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_nats::{ConnectOptions, Event};
use futures::StreamExt;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::subjects::HubSubjects;
use crate::transport::{EventSink, HubTransport, SubscriptionHandle, TransportEvent};

/// Opens NATS subscriptions on one call channel.
#[derive(Debug, Clone)]
pub struct NatsTransport {
    channel: String,
}

impl NatsTransport {
    /// Transport for the events of `channel`.
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }

    /// The subject subscriptions will listen on.
    pub fn subject(&self) -> String {
        HubSubjects::events(&self.channel)
    }
}

impl HubTransport for NatsTransport {
    type Subscription = NatsSubscription;

    /// Spawns the subscription task; must be called inside a Tokio runtime.
    fn open(&mut self, endpoint: &str, credential: &str, sink: EventSink) -> NatsSubscription {
        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(run_subscription(
            endpoint.to_string(),
            credential.to_string(),
            self.subject(),
            sink,
            stop_rx,
        ));
        NatsSubscription {
            stop: Some(stop_tx),
        }
    }
}

/// Handle to a running NATS subscription task.
///
/// Closing or dropping it stops the task and unsubscribes.
#[derive(Debug)]
pub struct NatsSubscription {
    stop: Option<oneshot::Sender<()>>,
}

impl SubscriptionHandle for NatsSubscription {
    fn close(self) {
        drop(self);
    }
}

impl Drop for NatsSubscription {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

async fn run_subscription(
    url: String,
    token: String,
    subject: String,
    sink: EventSink,
    mut stop: oneshot::Receiver<()>,
) {
    let link_dropped = Arc::new(AtomicBool::new(false));

    let callback_sink = sink.clone();
    let callback_flag = link_dropped.clone();
    let options = ConnectOptions::with_token(token).event_callback(move |event| {
        let sink = callback_sink.clone();
        let flag = callback_flag.clone();
        async move {
            match event {
                Event::Disconnected => {
                    flag.store(true, Ordering::SeqCst);
                    sink.emit(TransportEvent::Reconnecting(None));
                }
                Event::Connected => {
                    if flag.swap(false, Ordering::SeqCst) {
                        sink.emit(TransportEvent::Reconnected);
                    }
                }
                other => debug!(event = ?other, "hub client event"),
            }
        }
    });

    let client = tokio::select! {
        biased;
        _ = &mut stop => return,
        result = async_nats::connect_with_options(url.as_str(), options) => match result {
            Ok(client) => client,
            Err(e) => {
                warn!(%url, error = %e, "hub connection failed");
                sink.emit(TransportEvent::Failed(e.to_string()));
                return;
            }
        },
    };

    let mut subscriber = match client.subscribe(subject.clone()).await {
        Ok(subscriber) => subscriber,
        Err(e) => {
            warn!(%subject, error = %e, "hub subscribe failed");
            sink.emit(TransportEvent::Failed(e.to_string()));
            return;
        }
    };

    info!(%url, %subject, "hub subscription live");
    sink.emit(TransportEvent::Established);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => {
                if let Err(e) = subscriber.unsubscribe().await {
                    debug!(error = %e, "unsubscribe on stop failed");
                }
                info!(%subject, "hub subscription stopped");
                break;
            }
            next = subscriber.next() => match next {
                Some(message) => match std::str::from_utf8(&message.payload) {
                    Ok(text) => sink.emit(TransportEvent::Message(text.to_owned())),
                    Err(e) => warn!(error = %e, "ignoring non UTF-8 payload"),
                },
                None => {
                    info!(%subject, "hub stream ended");
                    sink.emit(TransportEvent::Closed(None));
                    break;
                }
            },
        }
    }
}
