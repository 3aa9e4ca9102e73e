//! Transport seam between the connection manager and the network.
//!
//! The application layer depends on these traits only.  The tokio TCP
//! implementation is in `infrastructure::network::tcp`, and a recording
//! mock for tests is in `infrastructure::network::mock`.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failure to establish a link during `connect`.
///
/// Absorbed by the connection manager: the state stays `Disconnected` and
/// the error is handed to observers and returned in the connect outcome.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The host name could not be resolved, or resolved to no address.
    #[error("could not resolve host {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// Nothing is listening on the remote port.
    #[error("connection to {host}:{port} refused")]
    Refused { host: String, port: u16 },

    /// The TCP handshake did not finish in time.
    #[error("timed out after {timeout:?} connecting to {host}:{port}")]
    Timeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    /// Any other connect failure (host unreachable, network down, ...).
    #[error("failed to connect to {host}:{port}: {source}")]
    Io {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to deliver a command on an established link.
///
/// Never returned to the caller of `send`; it is converted into a
/// `Connected → Disconnected` transition.
#[derive(Debug, Error)]
pub enum TransmissionError {
    /// The socket reported an error on write or flush.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    /// The media box closed its end of the connection.
    #[error("remote end closed the connection")]
    PeerClosed,

    /// The write did not complete in time; the box has stopped reading.
    #[error("write did not complete within {0:?}")]
    Timeout(Duration),
}

/// Opens links to a media box.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a link to `host:port`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] describing why the link could not be
    /// established.
    async fn open(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Box<dyn Transport>, ConnectionError>;
}

/// One established, exclusively owned link.
#[async_trait]
pub trait Transport: Send {
    /// Writes one already-encoded line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns a [`TransmissionError`] if the link is no longer usable.
    async fn write_line(&mut self, line: &[u8]) -> Result<(), TransmissionError>;

    /// Closes the link.  Errors are ignored; the link is gone either way.
    async fn shutdown(&mut self);
}
