//! CommandChannel: fire-and-forget command delivery.
//!
//! `send` writes one command line on the manager's live link and returns.
//! There is no acknowledgement from the box and no queue: a command sent
//! while disconnected is dropped.  A failed write is the only way the remote
//! learns that the box went away; it turns into a single
//! `Connected → Disconnected` notification from the manager.

use std::sync::Arc;

use mediabox_core::{encode_command, CommandRequest, ProtocolError};
use tracing::{debug, warn};

use crate::application::connection_manager::ConnectionManager;
use crate::application::transport::TransmissionError;

/// What happened to one [`CommandChannel::send`] call.
///
/// Purely informational: nothing here needs handling, and callers that
/// only care about delivery semantics may drop it.
#[derive(Debug)]
pub enum SendOutcome {
    /// The line was handed to the transport.
    ///
    /// A send already writing when `disconnect` runs still finishes and
    /// reports `Sent`, even though observers have been told `Disconnected`.
    Sent,
    /// No link was up; nothing was written.
    NotConnected,
    /// The command was not a valid single line; nothing was written.
    Rejected(ProtocolError),
    /// The write failed and the link was dropped.
    LinkLost(TransmissionError),
}

impl SendOutcome {
    /// Returns `true` only for [`SendOutcome::Sent`].
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }

    /// Short name of the outcome, for status displays.
    pub fn label(&self) -> &'static str {
        match self {
            SendOutcome::Sent => "Sent",
            SendOutcome::NotConnected => "NotConnected",
            SendOutcome::Rejected(_) => "Rejected",
            SendOutcome::LinkLost(_) => "LinkLost",
        }
    }
}

/// Sends commands over the link a [`ConnectionManager`] owns.
#[derive(Clone)]
pub struct CommandChannel {
    manager: Arc<ConnectionManager>,
}

impl CommandChannel {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    /// The manager whose link this channel writes to.
    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Sends `command` followed by `\n`.
    ///
    /// Never fails from the caller's point of view.  Concurrent sends are
    /// written one after the other, each line intact.
    pub async fn send(&self, command: &str) -> SendOutcome {
        let Some(lease) = self.manager.lease() else {
            debug!("dropping command {command:?}: not connected");
            return SendOutcome::NotConnected;
        };

        let request = match CommandRequest::new(command) {
            Ok(request) => request,
            Err(e) => {
                warn!("refusing to send {command:?}: {e}");
                return SendOutcome::Rejected(e);
            }
        };
        let line = encode_command(&request);

        let mut transport = lease.transport.lock().await;
        // The link may have been dropped while this send waited its turn.
        if !self.manager.is_current(lease.id) {
            debug!("dropping command {request}: link closed while waiting");
            return SendOutcome::NotConnected;
        }

        debug!("sending {request} to {}", lease.host);
        let write_timeout = self.manager.config().write_timeout;
        let written = match tokio::time::timeout(write_timeout, transport.write_line(&line)).await {
            Ok(result) => result,
            Err(_) => Err(TransmissionError::Timeout(write_timeout)),
        };
        match written {
            Ok(()) => SendOutcome::Sent,
            Err(e) => {
                drop(transport);
                self.manager.report_link_lost(lease.id, &e);
                SendOutcome::LinkLost(e)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
