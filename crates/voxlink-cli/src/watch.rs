//! `voxlink watch`: follow the hub and print the transcript as it grows.

use std::future::Future;
use std::io::{self, Write};

use chrono::Local;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType};
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tracing::info;
use voxlink_sdk::{
    ChatMessage, ConnectionStatus, HubTransport, IngestParams, IngestUpdate, RelayClient,
    RelayPayload, SourceTransport, TranscriptIngestor,
};

use crate::render;
use crate::HubArgs;

const FALLBACK_WIDTH: u16 = 80;

/// An auto-forward in flight. Resolves to the failure notice, if any.
type Forward = BoxFuture<'static, Result<(), String>>;

/// How a watch finished when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ended {
    /// Ingestion was off or misconfigured, so nothing was opened.
    NotStarted,
    /// The hub closed the subscription cleanly.
    Closed,
    /// The shutdown signal fired.
    Interrupted,
}

pub async fn run(hub: &HubArgs, enabled: bool, relay: Option<RelayClient>) -> anyhow::Result<()> {
    let transport = SourceTransport::new(hub.source, &hub.channel, hub.poll_interval());
    let mut ingestor = TranscriptIngestor::new(transport);
    let params = IngestParams::new(hub.hub_url.clone(), hub.token.clone(), enabled);
    info!(source = %hub.source, endpoint = %hub.hub_url, "watch starting");

    let mut stdout = io::stdout();
    let ended = follow(
        &mut ingestor,
        params,
        relay.as_ref(),
        &mut stdout,
        terminal_width,
        tokio::signal::ctrl_c(),
    )
    .await;
    ingestor.shutdown();

    if ended? != Ended::NotStarted {
        println!("{}", render::status_line(ingestor.status(), ingestor.error()));
    }
    Ok(())
}

/// Drive `ingestor` until the subscription ends or `shutdown` resolves,
/// writing every visible change to `out`.
///
/// A subscription that ends with an error is returned as `Err`. Forwards
/// still in flight when the hub closes are awaited so their failures are
/// reported; an interrupt drops them.
pub async fn follow<T, W>(
    ingestor: &mut TranscriptIngestor<T>,
    params: IngestParams,
    relay: Option<&RelayClient>,
    out: &mut W,
    width: impl Fn() -> u16,
    shutdown: impl Future,
) -> anyhow::Result<Ended>
where
    T: HubTransport,
    W: Write,
{
    ingestor.configure(params);
    writeln!(out, "{}", render::status_line(ingestor.status(), ingestor.error()))?;
    if !ingestor.has_subscription() {
        return Ok(Ended::NotStarted);
    }

    tokio::pin!(shutdown);
    let mut forwards: FuturesUnordered<Forward> = FuturesUnordered::new();
    let mut failure = None;

    let ended = loop {
        tokio::select! {
            _ = &mut shutdown => break Ended::Interrupted,
            Some(outcome) = forwards.next(), if !forwards.is_empty() => report(out, outcome)?,
            update = ingestor.next_update() => {
                let Some(update) = update else { break Ended::Closed };
                show(out, ingestor.messages(), &update, width())?;
                match update {
                    IngestUpdate::Appended(message) => {
                        if let Some(relay) = relay {
                            forwards.push(forward(relay, &message));
                        }
                    }
                    // Both transports stop for good once they report Disconnected.
                    IngestUpdate::Status { status: ConnectionStatus::Disconnected, error } => {
                        failure = error;
                        break Ended::Closed;
                    }
                    _ => {}
                }
            }
        }
    };

    if ended == Ended::Closed {
        while let Some(outcome) = forwards.next().await {
            report(out, outcome)?;
        }
    }

    match failure {
        Some(e) => Err(anyhow::Error::new(e).context("hub subscription ended")),
        None => Ok(ended),
    }
}

fn show(
    out: &mut impl Write,
    messages: &[ChatMessage],
    update: &IngestUpdate,
    width: u16,
) -> io::Result<()> {
    match update {
        IngestUpdate::Status { status, error } => {
            writeln!(out, "{}", render::status_line(*status, error.as_ref()))?;
            if *status == ConnectionStatus::Connected && messages.is_empty() {
                writeln!(out, "{}", render::WAITING)?;
            }
        }
        IngestUpdate::Appended(message) => {
            if messages.last().map(ChatMessage::id) == Some(message.id()) {
                writeln!(out, "{}\n", render::bubble(message, width, &Local))?;
            } else {
                // Landed before the tail: reprint in order.
                execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
                writeln!(out, "{}\n", render::transcript(messages, width, &Local))?;
            }
        }
        IngestUpdate::Cleared => {
            writeln!(out, "{}", render::CLEARED)?;
            writeln!(out, "{}", render::WAITING)?;
        }
    }
    out.flush()
}

fn forward(relay: &RelayClient, message: &ChatMessage) -> Forward {
    let text = message.text().to_string();
    let handle = relay.forward_detached(RelayPayload::from_message(message));
    async move {
        match handle.await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(render::failed_send(&text, &e)),
            Err(e) => Err(render::failed_send(&text, &e)),
        }
    }
    .boxed()
}

fn report(out: &mut impl Write, outcome: Result<(), String>) -> io::Result<()> {
    if let Err(notice) = outcome {
        writeln!(out, "{notice}")?;
        out.flush()?;
    }
    Ok(())
}

fn terminal_width() -> u16 {
    terminal::size().map_or(FALLBACK_WIDTH, |(cols, _)| cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};
    use voxlink_sdk::{EventSink, SubscriptionHandle, TransportEvent};

    const CALLER: &str = "call.input_audio.transcription.completed";
    const CLEAR_SCREEN: &str = "\x1b[2J";

    /// Transport that replays a fixed script as soon as it is opened.
    #[derive(Clone, Default)]
    struct ScriptedHub {
        script: Vec<TransportEvent>,
        opened: Rc<Cell<usize>>,
    }

    struct Quiet;

    impl SubscriptionHandle for Quiet {
        fn close(self) {}
    }

    impl HubTransport for ScriptedHub {
        type Subscription = Quiet;

        fn open(&mut self, _endpoint: &str, _credential: &str, sink: EventSink) -> Quiet {
            self.opened.set(self.opened.get() + 1);
            for event in &self.script {
                sink.emit(event.clone());
            }
            Quiet
        }
    }

    type Received = Arc<Mutex<Vec<Value>>>;

    async fn relay_answering(status: StatusCode) -> (RelayClient, Received) {
        let received: Received = Arc::default();
        let app = Router::new()
            .route(
                "/relay",
                post(
                    move |State(received): State<Received>, Json(body): Json<Value>| async move {
                        received.lock().unwrap().push(body);
                        (status, "boom")
                    },
                ),
            )
            .with_state(received.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (RelayClient::new(format!("http://{addr}/relay")), received)
    }

    fn said(timestamp: &str, message: &str) -> TransportEvent {
        TransportEvent::Message(
            json!({"type": CALLER, "data": {"timestamp": timestamp, "message": message}})
                .to_string(),
        )
    }

    fn valid() -> IngestParams {
        IngestParams::new("nats://hub", Some("t".into()), true)
    }

    struct Watched {
        ended: anyhow::Result<Ended>,
        output: String,
        ingestor: TranscriptIngestor<ScriptedHub>,
        opened: usize,
    }

    async fn watch(
        script: Vec<TransportEvent>,
        params: IngestParams,
        relay: Option<&RelayClient>,
    ) -> Watched {
        let hub = ScriptedHub {
            script,
            ..ScriptedHub::default()
        };
        let mut ingestor = TranscriptIngestor::new(hub.clone());
        let mut out = Vec::new();
        let ended = follow(
            &mut ingestor,
            params,
            relay,
            &mut out,
            || 60,
            std::future::pending::<()>(),
        )
        .await;
        Watched {
            ended,
            output: String::from_utf8(out).unwrap(),
            ingestor,
            opened: hub.opened.get(),
        }
    }

    #[tokio::test]
    async fn missing_token_prints_error_and_ends_cleanly() {
        let params = IngestParams::new("nats://hub", None, true);
        let watched = watch(vec![], params, None).await;

        assert_eq!(watched.ended.unwrap(), Ended::NotStarted);
        assert_eq!(
            watched.output,
            "[Disconnected] Authentication token is missing.\n"
        );
        assert_eq!(watched.opened, 0);
    }

    #[tokio::test]
    async fn disabled_ends_cleanly_without_opening() {
        let params = IngestParams::new("nats://hub", Some("t".into()), false);
        let watched = watch(vec![], params, None).await;

        assert_eq!(watched.ended.unwrap(), Ended::NotStarted);
        assert_eq!(watched.output, "[Disconnected]\n");
        assert_eq!(watched.opened, 0);
    }

    #[tokio::test]
    async fn clean_close_ends_ok() {
        let script = vec![
            TransportEvent::Established,
            said("2025-06-06T12:00:00Z", "hello"),
            TransportEvent::Closed(None),
        ];
        let watched = watch(script, valid(), None).await;

        assert_eq!(watched.ended.unwrap(), Ended::Closed);
        assert_eq!(watched.opened, 1);
        let output = &watched.output;
        assert!(output.starts_with("[Connecting]\n[Connected]\n"), "{output}");
        assert!(output.contains(render::WAITING));
        assert!(output.contains("│ hello"));
        assert!(output.ends_with("[Disconnected]\n"), "{output}");
        assert!(!output.contains(CLEAR_SCREEN));
    }

    #[tokio::test]
    async fn error_close_fails_the_command() {
        let script = vec![
            TransportEvent::Established,
            TransportEvent::Closed(Some("socket reset".into())),
        ];
        let watched = watch(script, valid(), None).await;

        let err = watched.ended.unwrap_err();
        assert_eq!(
            format!("{err:#}"),
            "hub subscription ended: Connection closed due to error: socket reset"
        );
        assert!(watched
            .output
            .contains("[Disconnected] Connection closed due to error: socket reset"));
    }

    #[tokio::test]
    async fn out_of_order_arrival_redraws_in_order() {
        let script = vec![
            TransportEvent::Established,
            said("2025-06-06T12:00:05Z", "second"),
            said("2025-06-06T12:00:00Z", "first"),
            TransportEvent::Closed(None),
        ];
        let watched = watch(script, valid(), None).await;

        assert_eq!(watched.ended.unwrap(), Ended::Closed);
        let output = &watched.output;
        let redraw = output.find(CLEAR_SCREEN).expect("no redraw");
        let after = &output[redraw..];
        let first = after.find("│ first").unwrap();
        let second = after.find("│ second").unwrap();
        assert!(first < second, "{output}");
    }

    #[tokio::test]
    async fn failed_forward_is_reported_and_leaves_state_alone() {
        let (relay, received) = relay_answering(StatusCode::INTERNAL_SERVER_ERROR).await;
        let script = vec![
            TransportEvent::Established,
            said("2025-06-06T12:00:00Z", "hello relay"),
            TransportEvent::Closed(None),
        ];
        let watched = watch(script, valid(), Some(&relay)).await;

        assert_eq!(watched.ended.unwrap(), Ended::Closed);
        assert!(
            watched
                .output
                .contains("✗ not relayed \"hello relay\": relay responded with 500: boom"),
            "{}",
            watched.output
        );

        let snapshot = watched.ingestor.snapshot();
        assert_eq!(snapshot.status, ConnectionStatus::Disconnected);
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.messages[0].text(), "hello relay");

        let bodies = received.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["transcript"], "hello relay");
        assert_eq!(bodies[0]["type"], "hub-forward");
    }

    #[tokio::test]
    async fn accepted_forward_prints_no_notice() {
        let (relay, received) = relay_answering(StatusCode::OK).await;
        let script = vec![
            TransportEvent::Established,
            said("2025-06-06T12:00:00Z", "hello relay"),
            TransportEvent::Closed(None),
        ];
        let watched = watch(script, valid(), Some(&relay)).await;

        assert_eq!(watched.ended.unwrap(), Ended::Closed);
        assert!(!watched.output.contains("not relayed"));
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn shutdown_signal_interrupts() {
        let hub = ScriptedHub {
            script: vec![TransportEvent::Established],
            ..ScriptedHub::default()
        };
        let mut ingestor = TranscriptIngestor::new(hub);
        let mut out = Vec::new();
        let ended = follow(
            &mut ingestor,
            valid(),
            None,
            &mut out,
            || 60,
            std::future::ready(()),
        )
        .await;
        assert_eq!(ended.unwrap(), Ended::Interrupted);
    }
}
