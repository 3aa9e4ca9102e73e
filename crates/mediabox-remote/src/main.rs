//! Mediabox remote, interactive shell.
//!
//! A line-oriented stand-in for the touch remote: each line typed is sent to
//! the box as one command, and lines starting with `:` control the link.
//!
//! # Usage
//!
//! ```text
//! mediabox-remote [OPTIONS]
//!
//! Options:
//!   --host <HOST>                 Box to connect to on startup
//!   --port <PORT>                 Remote-control port [config, default: 2048]
//!   --connect-timeout-ms <MS>     Connect timeout [config, default: 5000]
//!   --write-timeout-ms <MS>       Per-command write timeout [config, default: 5000]
//!   --config <PATH>               Config file [default: platform config dir]
//! ```
//!
//! | Variable                        | Overrides              |
//! |---------------------------------|------------------------|
//! | `MEDIABOX_HOST`                 | `--host`               |
//! | `MEDIABOX_PORT`                 | `--port`               |
//! | `MEDIABOX_CONNECT_TIMEOUT_MS`   | `--connect-timeout-ms` |
//! | `MEDIABOX_WRITE_TIMEOUT_MS`     | `--write-timeout-ms`   |
//! | `MEDIABOX_CONFIG`               | `--config`             |
//!
//! Log output is controlled by `RUST_LOG`; without it the `log_level` from
//! the config file applies.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mediabox_remote::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, ConfigError, RemoteConfigFile,
};
use mediabox_remote::infrastructure::ui_bridge::shell::{ShellInput, HELP};
use mediabox_remote::infrastructure::ui_bridge::{
    connect_to_host, disconnect_from_host, get_remote_status, send_remote_command,
    RemoteAppState,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remote control for a Mediabox media player.
#[derive(Debug, Parser)]
#[command(
    name = "mediabox-remote",
    about = "Send remote-control commands to a Mediabox over TCP",
    version
)]
struct Cli {
    /// Host name or IP address of the box to connect to on startup.
    #[arg(long, env = "MEDIABOX_HOST")]
    host: Option<String>,

    /// Remote-control port of the box.  Overrides the config file.
    #[arg(long, env = "MEDIABOX_PORT")]
    port: Option<u16>,

    /// Connect timeout in milliseconds.  Overrides the config file.
    #[arg(long, env = "MEDIABOX_CONNECT_TIMEOUT_MS")]
    connect_timeout_ms: Option<u64>,

    /// Write timeout per command in milliseconds.  Overrides the config file.
    #[arg(long, env = "MEDIABOX_WRITE_TIMEOUT_MS")]
    write_timeout_ms: Option<u64>,

    /// Path of the TOML config file.
    #[arg(long, env = "MEDIABOX_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Applies CLI overrides on top of the loaded config.
    fn apply_to(&self, config: &mut RemoteConfigFile) {
        if let Some(port) = self.port {
            config.connection.port = port;
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.connection.connect_timeout_ms = ms;
        }
        if let Some(ms) = self.write_timeout_ms {
            config.connection.write_timeout_ms = ms;
        }
    }
}

/// Where the config lives, if anywhere.
fn resolve_config_path(cli: &Cli) -> anyhow::Result<Option<PathBuf>> {
    match &cli.config {
        Some(path) => Ok(Some(path.clone())),
        None => match config_file_path() {
            Ok(path) => Ok(Some(path)),
            Err(ConfigError::NoPlatformConfigDir) => Ok(None),
            Err(e) => Err(e).context("failed to resolve config path"),
        },
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(&cli)?;
    let mut config = match &config_path {
        Some(path) => load_config_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RemoteConfigFile::default(),
    };
    cli.apply_to(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.remote.log_level)),
        )
        .init();

    if config_path.is_none() {
        warn!("no platform config directory; using defaults and not saving the last host");
    }
    info!(
        "mediabox remote starting, port {}, connect timeout {} ms",
        config.connection.port, config.connection.connect_timeout_ms
    );

    let state = RemoteAppState::with_tcp(config.to_connection_config());
    let mut shell = Shell {
        state,
        config,
        config_path,
    };

    if let Some(host) = cli.host.clone() {
        shell.connect(Some(host)).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line.context("failed to read from stdin")?;
                let Some(line) = line else {
                    break;
                };
                if !shell.handle(ShellInput::parse(&line)).await {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C, shutting down");
                break;
            }
        }
    }

    disconnect_from_host(Arc::clone(&shell.state)).await;
    info!("mediabox remote stopped");
    Ok(())
}

// ── Shell ─────────────────────────────────────────────────────────────────────

struct Shell {
    state: Arc<RemoteAppState>,
    config: RemoteConfigFile,
    config_path: Option<PathBuf>,
}

impl Shell {
    /// Runs one parsed line.  Returns `false` when the shell should exit.
    async fn handle(&mut self, input: ShellInput) -> bool {
        match input {
            ShellInput::Empty => {}
            ShellInput::Help => println!("{HELP}"),
            ShellInput::Quit => return false,
            ShellInput::Connect(host) => self.connect(host).await,
            ShellInput::Disconnect => {
                disconnect_from_host(Arc::clone(&self.state)).await;
                println!("disconnected");
            }
            ShellInput::Status => self.print_status().await,
            ShellInput::Command(command) => {
                let result = send_remote_command(Arc::clone(&self.state), command).await;
                if let Some(e) = result.error {
                    println!("not sent: {e}");
                } else if !self.state.controls.controls_enabled() {
                    println!("not connected (use :connect <host>)");
                }
            }
        }
        true
    }

    async fn connect(&mut self, host: Option<String>) {
        let Some(host) = host.or_else(|| self.config.remote.last_host.clone()) else {
            println!("no host given and none saved; use :connect <host>");
            return;
        };

        let result = connect_to_host(Arc::clone(&self.state), host.clone()).await;
        match (result.data, result.error) {
            (Some(outcome), _) => {
                println!("{}", outcome.outcome);
                if outcome.connected {
                    self.remember_host(host);
                }
            }
            (None, error) => println!(
                "connect failed: {}",
                error.unwrap_or_else(|| "unknown error".to_string())
            ),
        }
    }

    fn remember_host(&mut self, host: String) {
        if self.config.remote.last_host.as_deref() == Some(host.as_str()) {
            return;
        }
        self.config.remote.last_host = Some(host);
        if let Some(path) = &self.config_path {
            if let Err(e) = save_config_to(&self.config, path) {
                warn!("could not save last host: {e}");
            }
        }
    }

    async fn print_status(&self) {
        let Some(status) = get_remote_status(Arc::clone(&self.state)).await.data else {
            return;
        };
        let host = status.host.as_deref().unwrap_or("-");
        println!(
            "{} (host {host}, port {}, controls {})",
            status.connection_state,
            status.port,
            if status.controls_enabled { "enabled" } else { "disabled" }
        );
        if let Some(e) = status.last_error {
            println!("last connect error: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
