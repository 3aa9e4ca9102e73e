//! ConnectionManager: owns the single link to the media box.
//!
//! The manager is the only holder of the transport handle.  Collaborators
//! see it through [`ConnectionManager::connect`],
//! [`ConnectionManager::disconnect`], [`ConnectionManager::is_connected`]
//! and observer notifications; the command channel gets a short-lived lease
//! on the link for the duration of one send.
//!
//! # Locking
//!
//! State sits in a `std::sync::Mutex` that is never held across an `.await`,
//! so `is_connected` stays a cheap synchronous query.  The transport itself
//! sits behind a `tokio::sync::Mutex` so that one send at a time writes to
//! the socket.  Observers are notified after the state lock is released,
//! but while a second lock that only orders notifications is held.  An
//! observer may therefore query the manager, and must not wait on another
//! `connect` or `disconnect`.
//!
//! # Link generations
//!
//! Every connect attempt gets a fresh id that becomes the id of the link it
//! produces.  A failing send reports the id of the link it wrote to; reports
//! for a link that is no longer current are ignored.  This is what keeps a
//! burst of failing sends down to a single `Connected → Disconnected`
//! notification, and what lets `disconnect` abandon an attempt in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use mediabox_core::{ConnectionState, StateChange, DEFAULT_PORT};
use tracing::{debug, info, warn};

use crate::application::observer::{ConnectionObserver, ObserverRegistry};
use crate::application::transport::{
    ConnectionError, Connector, TransmissionError, Transport,
};

/// Transport handle shared between the manager and one in-flight send.
pub(crate) type SharedTransport = Arc<tokio::sync::Mutex<Box<dyn Transport>>>;

/// Settings for the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// TCP port of the media box.
    pub port: u16,
    /// Longest time a connect attempt may take, DNS lookup included.
    pub connect_timeout: Duration,
    /// Longest time one command write may take before the link is dropped.
    pub write_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// Result of a [`ConnectionManager::connect`] call.
///
/// Callers may ignore it: every transition it describes is also delivered
/// to observers.
#[derive(Debug)]
pub enum ConnectOutcome {
    /// The link is now up.  Observers were notified.
    Connected,
    /// A link was already up; nothing was opened.
    AlreadyConnected,
    /// Another connect attempt is in flight; this call did nothing.
    InProgress,
    /// The host was empty; the manager stays disconnected.
    NoAddress,
    /// `disconnect` was called while this attempt was in flight.
    Abandoned,
    /// The link could not be opened; the manager stays disconnected.
    Failed(ConnectionError),
}

impl ConnectOutcome {
    /// Returns `true` if a link is up after the call.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectOutcome::Connected | ConnectOutcome::AlreadyConnected)
    }

    /// Short name of the outcome, for status displays.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectOutcome::Connected => "Connected",
            ConnectOutcome::AlreadyConnected => "AlreadyConnected",
            ConnectOutcome::InProgress => "InProgress",
            ConnectOutcome::NoAddress => "NoAddress",
            ConnectOutcome::Abandoned => "Abandoned",
            ConnectOutcome::Failed(_) => "Failed",
        }
    }
}

/// A lease on the live link, valid for one send.
pub(crate) struct LinkLease {
    pub id: u64,
    pub host: String,
    pub transport: SharedTransport,
}

struct Link {
    id: u64,
    host: String,
    transport: SharedTransport,
}

enum Slot {
    Disconnected,
    Connecting { attempt: u64, host: String },
    Connected(Link),
}

struct Inner {
    slot: Slot,
    next_id: u64,
}

enum Resolution {
    Connected,
    Failed(ConnectionError),
    Abandoned(Option<Box<dyn Transport>>),
}

/// Owns at most one link to the media box.
pub struct ConnectionManager {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    inner: Mutex<Inner>,
    // Held from a state change until its observers have run, so that
    // notifications arrive in transition order.
    transitions: Mutex<()>,
    observers: ObserverRegistry,
}

impl ConnectionManager {
    /// Creates a disconnected manager that opens links through `connector`.
    pub fn new(config: ConnectionConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            inner: Mutex::new(Inner {
                slot: Slot::Disconnected,
                next_id: 0,
            }),
            transitions: Mutex::new(()),
            observers: ObserverRegistry::new(),
        }
    }

    /// Returns the settings this manager was built with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Opens a link to `host` on the configured port.
    ///
    /// - Already connected, or an attempt in flight: returns immediately.
    /// - Empty host: the manager stays disconnected.  This is not an error.
    /// - Transport failure: the manager stays disconnected, observers get
    ///   [`ConnectionObserver::on_connect_failed`], nothing is retried.
    /// - Success: observers get exactly one `Disconnected → Connected` change.
    pub async fn connect(&self, host: &str) -> ConnectOutcome {
        let host = host.trim();
        let attempt = {
            let mut inner = self.lock();
            match inner.slot {
                Slot::Connected(_) => {
                    debug!("connect({host}) ignored: already connected");
                    return ConnectOutcome::AlreadyConnected;
                }
                Slot::Connecting { .. } => {
                    debug!("connect({host}) ignored: attempt already in flight");
                    return ConnectOutcome::InProgress;
                }
                Slot::Disconnected => {}
            }
            if host.is_empty() {
                debug!("connect called without an address; staying disconnected");
                return ConnectOutcome::NoAddress;
            }
            inner.next_id += 1;
            let attempt = inner.next_id;
            inner.slot = Slot::Connecting {
                attempt,
                host: host.to_string(),
            };
            attempt
        };

        // Resets `Connecting` if this future is dropped mid-attempt.
        let _guard = AttemptGuard {
            manager: self,
            attempt,
        };

        info!("connecting to {host}:{}", self.config.port);
        let result = self
            .connector
            .open(host, self.config.port, self.config.connect_timeout)
            .await;

        let resolution = {
            let _order = self.order();
            let resolution = self.resolve_attempt(attempt, host, result);
            match &resolution {
                Resolution::Connected => {
                    info!("connected to {host}:{}", self.config.port);
                    self.observers.notify_state_changed(StateChange::CONNECTED);
                }
                Resolution::Failed(e) => {
                    warn!("could not connect to {host}: {e}");
                    self.observers.notify_connect_failed(host, e);
                }
                Resolution::Abandoned(_) => info!("connect attempt to {host} was abandoned"),
            }
            resolution
        };

        match resolution {
            Resolution::Connected => ConnectOutcome::Connected,
            Resolution::Failed(e) => ConnectOutcome::Failed(e),
            Resolution::Abandoned(transport) => {
                if let Some(mut transport) = transport {
                    transport.shutdown().await;
                }
                ConnectOutcome::Abandoned
            }
        }
    }

    fn resolve_attempt(
        &self,
        attempt: u64,
        host: &str,
        result: Result<Box<dyn Transport>, ConnectionError>,
    ) -> Resolution {
        let mut inner = self.lock();
        let current = matches!(inner.slot, Slot::Connecting { attempt: a, .. } if a == attempt);
        match result {
            Ok(transport) if current => {
                inner.slot = Slot::Connected(Link {
                    id: attempt,
                    host: host.to_string(),
                    transport: Arc::new(tokio::sync::Mutex::new(transport)),
                });
                Resolution::Connected
            }
            Ok(transport) => Resolution::Abandoned(Some(transport)),
            Err(e) if current => {
                inner.slot = Slot::Disconnected;
                Resolution::Failed(e)
            }
            Err(_) => Resolution::Abandoned(None),
        }
    }

    /// Returns `true` while a link is up.  No side effects.
    pub fn is_connected(&self) -> bool {
        matches!(self.lock().slot, Slot::Connected(_))
    }

    /// Returns the current state, `Connecting` included.
    pub fn state(&self) -> ConnectionState {
        match self.lock().slot {
            Slot::Disconnected => ConnectionState::Disconnected,
            Slot::Connecting { .. } => ConnectionState::Connecting,
            Slot::Connected(_) => ConnectionState::Connected,
        }
    }

    /// Host of the live link, or of the attempt in flight.
    pub fn host(&self) -> Option<String> {
        match &self.lock().slot {
            Slot::Disconnected => None,
            Slot::Connecting { host, .. } => Some(host.clone()),
            Slot::Connected(link) => Some(link.host.clone()),
        }
    }

    /// Closes the link if there is one and moves to `Disconnected`.
    ///
    /// Observers are notified only if a link was actually up.  An attempt in
    /// flight is abandoned: its link, if it arrives, is closed unused.
    ///
    /// Returns without waiting for a send that is still writing; that link is
    /// closed in the background once the write finishes or times out.
    pub async fn disconnect(&self) {
        let link = {
            let _order = self.order();
            let previous = std::mem::replace(&mut self.lock().slot, Slot::Disconnected);
            match previous {
                Slot::Connected(link) => {
                    info!("disconnecting from {}", link.host);
                    self.observers.notify_state_changed(StateChange::DISCONNECTED);
                    Some(link)
                }
                Slot::Connecting { host, .. } => {
                    info!("abandoning connect attempt to {host}");
                    None
                }
                Slot::Disconnected => {
                    debug!("disconnect ignored: not connected");
                    None
                }
            }
        };

        if let Some(link) = link {
            let closed = match link.transport.try_lock() {
                Ok(mut transport) => {
                    transport.shutdown().await;
                    true
                }
                Err(_) => false,
            };
            if !closed {
                debug!("send in flight on link to {}; closing it in the background", link.host);
                tokio::spawn(async move {
                    link.transport.lock().await.shutdown().await;
                });
            }
        }
    }

    /// Registers `observer` for state-change notifications.
    ///
    /// The manager keeps only a weak reference.
    pub fn on_state_changed<O: ConnectionObserver + 'static>(&self, observer: &Arc<O>) {
        self.observers.register(observer);
    }

    /// Hands out the live link for one send.
    pub(crate) fn lease(&self) -> Option<LinkLease> {
        match &self.lock().slot {
            Slot::Connected(link) => Some(LinkLease {
                id: link.id,
                host: link.host.clone(),
                transport: Arc::clone(&link.transport),
            }),
            _ => None,
        }
    }

    /// Returns `true` if `id` is still the live link.
    pub(crate) fn is_current(&self, id: u64) -> bool {
        matches!(&self.lock().slot, Slot::Connected(link) if link.id == id)
    }

    /// Drops link `id` after a failed send.
    ///
    /// Returns `true` if this report caused the transition.  Reports for a
    /// link that is already gone are ignored.
    pub(crate) fn report_link_lost(&self, id: u64, error: &TransmissionError) -> bool {
        let _order = self.order();
        let lost = {
            let mut inner = self.lock();
            if !matches!(&inner.slot, Slot::Connected(link) if link.id == id) {
                return false;
            }
            std::mem::replace(&mut inner.slot, Slot::Disconnected)
        };
        if let Slot::Connected(link) = lost {
            warn!("lost link to {}: {error}", link.host);
        }
        self.observers.notify_state_changed(StateChange::DISCONNECTED);
        true
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn order(&self) -> MutexGuard<'_, ()> {
        self.transitions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Puts the manager back to `Disconnected` if a connect future is dropped
/// before its attempt resolves.
struct AttemptGuard<'a> {
    manager: &'a ConnectionManager,
    attempt: u64,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.manager.lock();
        if matches!(inner.slot, Slot::Connecting { attempt, .. } if attempt == self.attempt) {
            debug!("connect attempt {} dropped before completion", self.attempt);
            inner.slot = Slot::Disconnected;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
