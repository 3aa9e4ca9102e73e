//! Mock connector for tests.
//!
//! `MockConnector` hands out in-memory transports that push every line they
//! are given into a shared [`MockWire`].  Tests keep an `Arc<MockWire>` and
//! inspect exactly what reached the "box" and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let connector = Arc::new(MockConnector::new());
//! let wire = connector.wire();
//! let manager = ConnectionManager::new(ConnectionConfig::default(), connector);
//!
//! manager.connect("mediabox.local").await;
//! CommandChannel::new(Arc::new(manager)).send("PLAY").await;
//!
//! assert_eq!(wire.sent_lines(), ["PLAY\n"]);
//! ```
//!
//! # Failure switches
//!
//! `set_fail_opens(true)` makes every `open` return `ConnectionError::Refused`.
//! `set_fail_writes(true)` makes every write return `PeerClosed`, which is how
//! a box that went away looks to the command channel.  The delays hold an
//! `open` or a write pending so tests can interleave operations.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::transport::{ConnectionError, Connector, TransmissionError, Transport};

/// What the mock transports did, shared by every transport of one connector.
#[derive(Debug, Default)]
pub struct MockWire {
    /// Every line written, terminator included.
    pub lines: Mutex<Vec<Vec<u8>>>,
    /// Hosts passed to `open`, successful or not.
    pub open_hosts: Mutex<Vec<String>>,
    /// Number of transports that were shut down.
    pub shutdowns: AtomicUsize,
    fail_opens: AtomicBool,
    fail_writes: AtomicBool,
    open_delay_ms: AtomicU64,
    write_delay_ms: AtomicU64,
}

impl MockWire {
    /// Lines written so far, decoded as UTF-8.
    pub fn sent_lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect()
    }

    /// Number of `open` calls.
    pub fn open_count(&self) -> usize {
        self.open_hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of transports shut down.
    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    /// When `true`, `open` fails with `Refused`.
    pub fn set_fail_opens(&self, fail: bool) {
        self.fail_opens.store(fail, Ordering::SeqCst);
    }

    /// When `true`, writes fail with `PeerClosed`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Holds every `open` pending for `delay`.
    pub fn set_open_delay(&self, delay: Duration) {
        self.open_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Holds every write pending for `delay`.
    pub fn set_write_delay(&self, delay: Duration) {
        self.write_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

async fn pause(ms: &AtomicU64) {
    let ms = ms.load(Ordering::SeqCst);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// A connector that records instead of opening sockets.
#[derive(Debug, Default)]
pub struct MockConnector {
    wire: Arc<MockWire>,
}

impl MockConnector {
    /// Creates a connector with an empty wire and no failures armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// The wire shared by every transport this connector opens.
    pub fn wire(&self) -> Arc<MockWire> {
        Arc::clone(&self.wire)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(
        &self,
        host: &str,
        port: u16,
        _timeout: Duration,
    ) -> Result<Box<dyn Transport>, ConnectionError> {
        self.wire
            .open_hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(host.to_string());
        pause(&self.wire.open_delay_ms).await;
        if self.wire.fail_opens.load(Ordering::SeqCst) {
            return Err(ConnectionError::Refused {
                host: host.to_string(),
                port,
            });
        }
        Ok(Box::new(MockTransport {
            wire: Arc::clone(&self.wire),
            closed: false,
        }))
    }
}

struct MockTransport {
    wire: Arc<MockWire>,
    closed: bool,
}

#[async_trait]
impl Transport for MockTransport {
    async fn write_line(&mut self, line: &[u8]) -> Result<(), TransmissionError> {
        pause(&self.wire.write_delay_ms).await;
        if self.closed || self.wire.fail_writes.load(Ordering::SeqCst) {
            return Err(TransmissionError::PeerClosed);
        }
        self.wire
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_vec());
        Ok(())
    }

    async fn shutdown(&mut self) {
        if !self.closed {
            self.closed = true;
            self.wire.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transport_records_lines_in_order() {
        let connector = MockConnector::new();
        let wire = connector.wire();
        let mut transport = connector
            .open("box", 2048, Duration::from_secs(1))
            .await
            .unwrap();

        transport.write_line(b"UP\n").await.unwrap();
        transport.write_line(b"DOWN\n").await.unwrap();

        assert_eq!(wire.sent_lines(), ["UP\n", "DOWN\n"]);
        assert_eq!(wire.open_count(), 1);
    }

    #[tokio::test]
    async fn test_fail_switches_take_effect() {
        let connector = MockConnector::new();
        let wire = connector.wire();
        let mut transport = connector
            .open("box", 2048, Duration::from_secs(1))
            .await
            .unwrap();

        wire.set_fail_writes(true);
        wire.set_fail_opens(true);

        assert!(matches!(
            transport.write_line(b"PLAY\n").await,
            Err(TransmissionError::PeerClosed)
        ));
        assert!(connector.open("box", 2048, Duration::from_secs(1)).await.is_err());
        assert!(wire.sent_lines().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_is_counted_once_and_closes_transport() {
        let connector = MockConnector::new();
        let wire = connector.wire();
        let mut transport = connector
            .open("box", 2048, Duration::from_secs(1))
            .await
            .unwrap();

        transport.shutdown().await;
        transport.shutdown().await;

        assert_eq!(wire.shutdown_count(), 1);
        assert!(transport.write_line(b"PLAY\n").await.is_err());
    }
}
