//! Command bridge between a front end and the remote.
//!
//! A touch UI, the interactive shell, or any other front end drives the
//! remote through the async command functions in this module.  Each one
//! takes the shared [`RemoteAppState`] and returns a serialisable DTO wrapped
//! in [`RemoteCommandResult`]:
//!
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```
//!
//! # Enabling controls
//!
//! [`ControlsObserver`] is registered on the connection manager when the
//! state is built.  It turns every state change into a `controls_enabled`
//! flag: buttons that send commands are usable exactly while a link is up.
//! It also keeps the text of the last connect failure for display.

pub mod shell;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use mediabox_core::StateChange;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::command_channel::{CommandChannel, SendOutcome};
use crate::application::connection_manager::{ConnectOutcome, ConnectionConfig, ConnectionManager};
use crate::application::observer::ConnectionObserver;
use crate::application::transport::ConnectionError;
use crate::infrastructure::network::tcp::TcpConnector;

// ── Controls observer ─────────────────────────────────────────────────────────

/// Tracks whether command controls should be enabled.
#[derive(Debug, Default)]
pub struct ControlsObserver {
    enabled: AtomicBool,
    transitions: AtomicUsize,
    last_error: Mutex<Option<String>>,
}

impl ControlsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while a link is up.
    pub fn controls_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Number of state changes seen so far.
    pub fn transitions(&self) -> usize {
        self.transitions.load(Ordering::SeqCst)
    }

    /// Message of the most recent connect failure, cleared on connect.
    pub fn last_error(&self) -> Option<String> {
        self.error_slot().clone()
    }

    fn error_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.last_error.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConnectionObserver for ControlsObserver {
    fn on_state_changed(&self, change: StateChange) {
        self.enabled.store(change.is_connected(), Ordering::SeqCst);
        self.transitions.fetch_add(1, Ordering::SeqCst);
        if change.is_connected() {
            *self.error_slot() = None;
        }
        debug!("controls {}", if change.is_connected() { "enabled" } else { "disabled" });
    }

    fn on_connect_failed(&self, _host: &str, error: &ConnectionError) {
        *self.error_slot() = Some(error.to_string());
    }
}

// ── Shared application state ──────────────────────────────────────────────────

/// State shared by every command handler.
pub struct RemoteAppState {
    pub manager: Arc<ConnectionManager>,
    pub channel: CommandChannel,
    pub controls: Arc<ControlsObserver>,
}

impl RemoteAppState {
    /// Wraps `manager` and registers a [`ControlsObserver`] on it.
    pub fn new(manager: Arc<ConnectionManager>) -> Arc<Self> {
        let controls = Arc::new(ControlsObserver::new());
        manager.on_state_changed(&controls);
        Arc::new(Self {
            channel: CommandChannel::new(Arc::clone(&manager)),
            manager,
            controls,
        })
    }

    /// State backed by a real TCP connector.
    pub fn with_tcp(config: ConnectionConfig) -> Arc<Self> {
        Self::new(Arc::new(ConnectionManager::new(
            config,
            Arc::new(TcpConnector::new()),
        )))
    }
}

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Status snapshot for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStatusDto {
    /// `"disconnected"`, `"connecting"` or `"connected"`.
    pub connection_state: String,
    pub host: Option<String>,
    pub port: u16,
    pub controls_enabled: bool,
    pub last_error: Option<String>,
}

/// Result of a connect request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOutcomeDto {
    /// Name of the [`ConnectOutcome`] variant.
    pub outcome: String,
    pub connected: bool,
}

/// Unified response wrapper for bridge commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct RemoteCommandResult<T: Serialize> {
    /// `true` if the command completed successfully; `false` on error.
    pub success: bool,
    /// The command's return value, present only when `success` is `true`.
    pub data: Option<T>,
    /// A human-readable error message, present only when `success` is `false`.
    pub error: Option<String>,
}

impl<T: Serialize> RemoteCommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returns the current status snapshot.
pub async fn get_remote_status(state: Arc<RemoteAppState>) -> RemoteCommandResult<RemoteStatusDto> {
    RemoteCommandResult::ok(RemoteStatusDto {
        connection_state: state.manager.state().to_string(),
        host: state.manager.host(),
        port: state.manager.config().port,
        controls_enabled: state.controls.controls_enabled(),
        last_error: state.controls.last_error(),
    })
}

/// Connects to `host`.
///
/// A failed connect is reported as `success: false` with the error text; the
/// state is left `Disconnected`.
pub async fn connect_to_host(
    state: Arc<RemoteAppState>,
    host: String,
) -> RemoteCommandResult<ConnectOutcomeDto> {
    let outcome = state.manager.connect(&host).await;
    match outcome {
        ConnectOutcome::Failed(e) => RemoteCommandResult::err(e.to_string()),
        ConnectOutcome::NoAddress => RemoteCommandResult::err("no host address given"),
        other => RemoteCommandResult::ok(ConnectOutcomeDto {
            outcome: other.label().to_string(),
            connected: other.is_connected(),
        }),
    }
}

/// Sends one command, fire-and-forget.
///
/// Only a command that is not a valid single line is an error.  A lost link
/// is not: it shows up as `controls_enabled = false` in the next status.
pub async fn send_remote_command(
    state: Arc<RemoteAppState>,
    command: String,
) -> RemoteCommandResult<()> {
    match state.channel.send(&command).await {
        SendOutcome::Rejected(e) => RemoteCommandResult::err(e.to_string()),
        _ => RemoteCommandResult::ok(()),
    }
}

/// Closes the link if there is one.
pub async fn disconnect_from_host(state: Arc<RemoteAppState>) -> RemoteCommandResult<()> {
    state.manager.disconnect().await;
    RemoteCommandResult::ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
