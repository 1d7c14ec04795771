//! Input relay forwarder: entry point.
//!
//! Reads raw operator input as newline-delimited JSON on stdin, normalizes
//! it, and forwards it to a remote peer over a WebSocket.
//!
//! # Usage
//!
//! ```text
//! relay-forwarder [OPTIONS]
//!
//! Options:
//!   --config    <PATH>   Config file [default: platform config dir]
//!   --peer-url  <URL>    Peer WebSocket URL          [env: RELAY_PEER_URL]
//!   --locale    <TAG>    Remote keyboard layout      [env: RELAY_LOCALE]
//!   --log-level <LEVEL>  Log level when RUST_LOG is unset
//! ```
//!
//! Command-line values override the config file for this run only; they are
//! never written back.
//!
//! # Architecture overview
//!
//! ```text
//! stdin (JSON lines)
//!       ↓
//! JsonLinesInputSource ──▶ ForwardInputUseCase ──▶ WebSocketTransport ──▶ peer
//!                              │        ▲
//!                  TomlSettingsStore   LogNotifier
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use relay_core::KeyboardLayout;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use relay_forwarder::infrastructure::input_source::stdin::JsonLinesInputSource;
use relay_forwarder::infrastructure::input_source::InputSource;
use relay_forwarder::infrastructure::network::WebSocketTransport;
use relay_forwarder::infrastructure::storage::config::{config_file_path, load_config_from};
use relay_forwarder::infrastructure::storage::{ForwarderConfig, TomlSettingsStore};
use relay_forwarder::infrastructure::ui_bridge::LogNotifier;
use relay_forwarder::{ForwardInputUseCase, SessionOptions};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Forwards keyboard, pointer, and touch input to a remote peer.
#[derive(Debug, Parser)]
#[command(
    name = "relay-forwarder",
    about = "Forwards normalized keyboard, pointer, and touch input to a remote peer",
    version
)]
struct Cli {
    /// Path of the TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// WebSocket URL of the peer's input endpoint.
    #[arg(long, env = "RELAY_PEER_URL")]
    peer_url: Option<String>,

    /// Locale tag of the remote keyboard layout, e.g. `en-GB`.
    #[arg(long, env = "RELAY_LOCALE")]
    locale: Option<String>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long)]
    log_level: Option<String>,
}

/// Effective settings for this run: the config file with CLI overrides applied.
#[derive(Debug, Clone, PartialEq)]
struct RunSettings {
    peer_url: String,
    locale: String,
    log_level: String,
    ack_timeout: Duration,
    initial_pointer_interval: Duration,
}

impl Cli {
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("no --config given and no platform config dir"),
        }
    }

    fn resolve(&self, file: &ForwarderConfig) -> RunSettings {
        RunSettings {
            peer_url: self
                .peer_url
                .clone()
                .unwrap_or_else(|| file.network.peer_url.clone()),
            locale: self
                .locale
                .clone()
                .unwrap_or_else(|| file.keyboard.locale.clone()),
            log_level: self
                .log_level
                .clone()
                .unwrap_or_else(|| file.forwarder.log_level.clone()),
            ack_timeout: file.network.ack_timeout(),
            initial_pointer_interval: file.pointer.initial_interval(),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path()?;
    let config = load_config_from(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let run = cli.resolve(&config);

    // `RUST_LOG` wins; otherwise the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&run.log_level)),
        )
        .init();

    info!("relay forwarder starting, peer={}", run.peer_url);

    let layout = KeyboardLayout::from_locale(&run.locale).unwrap_or_else(|| {
        warn!("unsupported keyboard locale {:?}; using en-US", run.locale);
        KeyboardLayout::EnUs
    });

    // ── Wire the session ──────────────────────────────────────────────────────
    let transport = Arc::new(
        WebSocketTransport::connect(&run.peer_url, run.ack_timeout)
            .await
            .with_context(|| format!("failed to connect to peer at {}", run.peer_url))?,
    );
    let settings = Arc::new(TomlSettingsStore::new(config_path, config));
    let notifier = Arc::new(LogNotifier::new());
    let mut session = ForwardInputUseCase::new(
        transport.clone(),
        settings,
        notifier,
        SessionOptions {
            layout,
            initial_pointer_interval: run.initial_pointer_interval,
            ..SessionOptions::default()
        },
    );

    let source = JsonLinesInputSource::stdin();
    let mut events = source.start().context("failed to start input source")?;

    // ── Main loop ─────────────────────────────────────────────────────────────
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => session.handle_event(event),
                None => {
                    info!("input stream ended");
                    break;
                }
            },
            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    warn!("failed to listen for Ctrl+C signal: {e}");
                }
                info!("shutting down");
                break;
            }
        }
    }

    source.stop();
    session.shutdown().await;
    transport.close();

    info!("relay forwarder stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_come_from_config_file() {
        // Arrange
        let cli = Cli::parse_from(["relay-forwarder"]);
        let file = ForwarderConfig::default();

        // Act
        let run = cli.resolve(&file);

        // Assert
        assert_eq!(run.peer_url, "ws://127.0.0.1:8080/input");
        assert_eq!(run.locale, "en-US");
        assert_eq!(run.log_level, "info");
        assert_eq!(run.ack_timeout, Duration::from_millis(2000));
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let cli = Cli::parse_from([
            "relay-forwarder",
            "--peer-url",
            "ws://10.0.0.5:9000/input",
            "--locale",
            "en-GB",
            "--log-level",
            "debug",
        ]);

        let run = cli.resolve(&ForwarderConfig::default());

        assert_eq!(run.peer_url, "ws://10.0.0.5:9000/input");
        assert_eq!(run.locale, "en-GB");
        assert_eq!(run.log_level, "debug");
    }

    #[test]
    fn test_explicit_config_path_is_used() {
        let cli = Cli::parse_from(["relay-forwarder", "--config", "/tmp/relay.toml"]);
        assert_eq!(cli.config_path().unwrap(), PathBuf::from("/tmp/relay.toml"));
    }
}
