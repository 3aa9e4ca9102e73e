//! Connection state machine vocabulary.
//!
//! ```text
//!                connect(host) ok
//! Disconnected ──────────────────────▶ Connected
//!      ▲   │                               │
//!      │   │ connect(host)                 │ disconnect() / send failure
//!      │   ▼                               │
//!      └─ Connecting ◀── (transient) ──────┘
//! ```
//!
//! `Connecting` only exists while a connect attempt is in flight.  Observers
//! are told about `Disconnected ⇄ Connected` transitions only, and only the
//! two [`StateChange`] constants are ever emitted.

use serde::{Deserialize, Serialize};

/// State of the single link a connection manager owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No link.  Initial state.
    #[default]
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The link is up and commands can be sent.
    Connected,
}

impl ConnectionState {
    /// Returns `true` only for [`ConnectionState::Connected`].
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// A real transition between `Disconnected` and `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

impl StateChange {
    /// The `Disconnected → Connected` transition.
    pub const CONNECTED: StateChange = StateChange {
        from: ConnectionState::Disconnected,
        to: ConnectionState::Connected,
    };

    /// The `Connected → Disconnected` transition.
    pub const DISCONNECTED: StateChange = StateChange {
        from: ConnectionState::Connected,
        to: ConnectionState::Disconnected,
    };

    /// Whether the link is up after this change.
    pub fn is_connected(&self) -> bool {
        self.to.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_only_connected_reports_is_connected() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(!ConnectionState::Disconnected.is_connected());
    }

    #[test]
    fn test_transition_constants_point_in_opposite_directions() {
        assert_eq!(StateChange::CONNECTED.from, StateChange::DISCONNECTED.to);
        assert_eq!(StateChange::CONNECTED.to, StateChange::DISCONNECTED.from);
        assert!(StateChange::CONNECTED.is_connected());
        assert!(!StateChange::DISCONNECTED.is_connected());
    }

    #[test]
    fn test_display_is_lowercase() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
    }
}
