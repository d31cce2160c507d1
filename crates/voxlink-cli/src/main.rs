mod render;
mod watch;

use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use voxlink_sdk::{RelayClient, SourceKind};

#[derive(Parser, Debug)]
#[command(name = "voxlink")]
#[command(about = "Live call transcript viewer and relay forwarder")]
#[command(author, version, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub hub: HubArgs,

    /// Relay endpoint transcripts are POSTed to
    #[arg(
        long,
        global = true,
        env = "VOXLINK_RELAY_URL",
        default_value = "http://localhost:3002/api/relay"
    )]
    pub relay_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct HubArgs {
    /// Hub endpoint: a nats:// URL, or the events URL with `--source poll`
    #[arg(long, global = true, env = "VOXLINK_HUB_URL", default_value = "")]
    pub hub_url: String,

    /// Access token presented to the hub
    #[arg(long, global = true, env = "VOXLINK_AUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Hub channel carrying the call (NATS only)
    #[arg(long, global = true, env = "VOXLINK_CHANNEL", default_value = "default")]
    pub channel: String,

    /// Where events come from: nats or poll
    #[arg(long, global = true, default_value_t = SourceKind::Nats)]
    pub source: SourceKind,

    /// Poll cadence in milliseconds (poll only)
    #[arg(long, global = true, default_value_t = 2000)]
    pub poll_interval_ms: u64,
}

impl HubArgs {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow the live call and print its transcript
    Watch {
        /// Relay every new transcript line
        #[arg(long)]
        auto_forward: bool,

        /// Start with ingestion switched off
        #[arg(long)]
        disabled: bool,
    },
    /// Relay typed text as the user
    Send {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Send a timestamped test message to the relay
    PingRelay,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let relay = RelayClient::new(&cli.relay_url);

    match cli.command {
        Commands::Watch {
            auto_forward,
            disabled,
        } => {
            let forward = auto_forward.then_some(relay);
            watch::run(&cli.hub, !disabled, forward).await?;
        }
        Commands::Send { text } => {
            let text = text.join(" ");
            let receipt = relay
                .send_text(&text)
                .await
                .with_context(|| format!("could not relay to {}", cli.relay_url))?;
            println!("✓ sent ({})", receipt.status);
        }
        Commands::PingRelay => {
            let text = format!(
                "voxlink test message at {}",
                chrono::Local::now().format("%H:%M:%S")
            );
            let receipt = relay
                .send_text(&text)
                .await
                .with_context(|| format!("relay at {} did not accept the ping", cli.relay_url))?;
            println!("✓ {text} ({})", receipt.status);
            if !receipt.body.is_empty() {
                println!("{}", receipt.body);
            }
        }
    }

    Ok(())
}
