//! Development hub feeder: plays a short scripted call onto the NATS hub so
//! `voxlink watch` has something to display without a live voice agent.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use clap::Parser;
use tracing::info;
use voxlink_models::{EventKind, RawEvent};
use voxlink_sdk::HubSubjects;

#[derive(Parser, Debug)]
#[command(name = "mock-hub")]
#[command(about = "Publish a scripted call onto the VoxLink hub")]
struct Args {
    #[arg(long, default_value = "nats://localhost:4222")]
    nats_url: String,

    /// Token presented to the NATS server, if it wants one
    #[arg(long, env = "VOXLINK_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, default_value = "default")]
    channel: String,

    /// Pause between published events
    #[arg(long, default_value_t = 1500)]
    delay_ms: u64,

    /// Do not publish the closing `call.disconnected`
    #[arg(long, default_value_t = false)]
    keep_open: bool,
}

/// Spacing of the scripted transcript timestamps.
const TURN_GAP: TimeDelta = TimeDelta::seconds(5);

const SCRIPT: [(EventKind, &str); 8] = [
    (
        EventKind::CallerTranscript,
        "Hello, I'm the caller speaking first.",
    ),
    (
        EventKind::CounterpartTranscript,
        "Okay, I hear you. How can I help today?",
    ),
    (
        EventKind::CallerTranscript,
        "I'd like to check on an order I placed last week. It was supposed to arrive yesterday but I haven't seen anything yet.",
    ),
    (
        EventKind::CounterpartTranscript,
        "Acknowledged. Let me look that up for you. Could you read me the order number?",
    ),
    (EventKind::CallerTranscript, "Sure, it's 4 8 1 5 1 6."),
    (
        EventKind::CounterpartTranscript,
        "Thanks. The parcel left the depot this morning and should reach you before six.",
    ),
    (EventKind::CallerTranscript, "Great, that's all I needed."),
    (
        EventKind::CounterpartTranscript,
        "Glad I could help. Have a good evening.",
    ),
];

/// The full call: connect marker, the scripted turns `TURN_GAP` apart from
/// `start`, and the disconnect marker unless `keep_open`.
fn script(start: DateTime<Utc>, keep_open: bool) -> Vec<RawEvent> {
    let mut events = vec![RawEvent::marker(EventKind::CallConnected)];
    let mut at = start;
    for (kind, text) in SCRIPT {
        events.push(RawEvent::new(
            kind,
            at.to_rfc3339_opts(SecondsFormat::Secs, true),
            text,
        ));
        at += TURN_GAP;
    }
    if !keep_open {
        events.push(RawEvent::marker(EventKind::CallDisconnected));
    }
    events
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let client = match &args.token {
        Some(token) => async_nats::ConnectOptions::with_token(token.clone())
            .connect(&args.nats_url)
            .await,
        None => async_nats::connect(&args.nats_url).await,
    }
    .with_context(|| format!("could not connect to {}", args.nats_url))?;

    let subject = HubSubjects::events(&args.channel);
    info!(url = %args.nats_url, %subject, "connected, playing scripted call");

    let delay = Duration::from_millis(args.delay_ms);
    for event in script(Utc::now(), args.keep_open) {
        let payload = serde_json::to_vec(&event)?;
        client
            .publish(subject.clone(), payload.into())
            .await
            .context("publish failed")?;
        info!(kind = %event.event_type, "published");
        tokio::time::sleep(delay).await;
    }

    client.flush().await.context("flush failed")?;
    info!("script finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        "2025-06-06T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn script_is_bracketed_by_markers() {
        let events = script(start(), false);
        assert_eq!(events.len(), SCRIPT.len() + 2);
        assert_eq!(events[0].kind(), Some(EventKind::CallConnected));
        assert_eq!(events.last().unwrap().kind(), Some(EventKind::CallDisconnected));
    }

    #[test]
    fn keep_open_omits_disconnect() {
        let events = script(start(), true);
        assert_eq!(events.len(), SCRIPT.len() + 1);
        assert_ne!(events.last().unwrap().kind(), Some(EventKind::CallDisconnected));
    }

    #[test]
    fn turns_alternate_five_seconds_apart() {
        let events = script(start(), false);
        let turns = &events[1..=SCRIPT.len()];

        for (i, event) in turns.iter().enumerate() {
            let expected = if i % 2 == 0 {
                EventKind::CallerTranscript
            } else {
                EventKind::CounterpartTranscript
            };
            assert_eq!(event.kind(), Some(expected));
        }
        let stamps: Vec<&str> = turns
            .iter()
            .map(|e| e.transcript().unwrap().timestamp.as_str())
            .collect();
        assert_eq!(stamps[0], "2025-06-06T12:00:00Z");
        assert_eq!(stamps[1], "2025-06-06T12:00:05Z");
        assert_eq!(stamps[7], "2025-06-06T12:00:35Z");
    }

    #[test]
    fn events_serialize_to_wire_shape() {
        let events = script(start(), false);
        let json = serde_json::to_value(&events[1]).unwrap();
        assert_eq!(json["type"], "call.input_audio.transcription.completed");
        assert_eq!(json["data"]["timestamp"], "2025-06-06T12:00:00Z");
        let marker = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(marker, serde_json::json!({ "type": "call.connected" }));
    }
}
