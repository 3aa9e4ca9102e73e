//! TCP link to the media box.
//!
//! The box never writes back on the remote-control port, so the read side of
//! the socket is only used to notice that the box has gone away: before each
//! write the transport does a non-blocking read.  End of stream means the box
//! closed the link; stray bytes, if the box ever sends any, are discarded.
//!
//! Without that probe the first write after the box disappears would still
//! succeed (the kernel buffers it) and the loss would only surface one
//! command later.

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};
use tokio::time;
use tracing::{debug, trace};

use crate::application::transport::{ConnectionError, Connector, TransmissionError, Transport};

/// Opens [`TcpTransport`]s with `tokio::net::TcpStream`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl TcpConnector {
    /// Creates a connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn open(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Box<dyn Transport>, ConnectionError> {
        let stream = time::timeout(timeout, connect_stream(host, port))
            .await
            .map_err(|_| ConnectionError::Timeout {
                host: host.to_string(),
                port,
                timeout,
            })??;

        // Commands are tiny and latency-sensitive.
        if let Err(e) = stream.set_nodelay(true) {
            debug!("could not disable Nagle on link to {host}: {e}");
        }
        Ok(Box::new(TcpTransport::new(stream)))
    }
}

/// Resolves `host` and tries each address in turn.
async fn connect_stream(host: &str, port: u16) -> Result<TcpStream, ConnectionError> {
    let addrs = lookup_host((host, port))
        .await
        .map_err(|source| ConnectionError::Resolve {
            host: host.to_string(),
            source,
        })?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                debug!("TCP link established to {addr}");
                return Ok(stream);
            }
            Err(e) => {
                debug!("connect to {addr} failed: {e}");
                last_error = Some(e);
            }
        }
    }

    Err(match last_error {
        Some(source) => classify(host, port, source),
        None => ConnectionError::Resolve {
            host: host.to_string(),
            source: std::io::Error::new(ErrorKind::NotFound, "host resolved to no addresses"),
        },
    })
}

fn classify(host: &str, port: u16, source: std::io::Error) -> ConnectionError {
    match source.kind() {
        ErrorKind::ConnectionRefused => ConnectionError::Refused {
            host: host.to_string(),
            port,
        },
        _ => ConnectionError::Io {
            host: host.to_string(),
            port,
            source,
        },
    }
}

/// One open TCP link.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Wraps an already connected stream.
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Fails if the box has closed or reset its end of the link.
    fn probe_peer(&self) -> Result<(), TransmissionError> {
        let mut scratch = [0u8; 256];
        loop {
            match self.stream.try_read(&mut scratch) {
                Ok(0) => return Err(TransmissionError::PeerClosed),
                Ok(n) => trace!("discarding {n} unsolicited bytes from the box"),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn write_line(&mut self, line: &[u8]) -> Result<(), TransmissionError> {
        self.probe_peer()?;
        self.stream.write_all(line).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!("shutdown of TCP link failed: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_secs(2);

    async fn unused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_write_line_arrives_verbatim() {
        // Arrange
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        // Act
        let mut transport = TcpConnector::new()
            .open("127.0.0.1", port, TIMEOUT)
            .await
            .unwrap();
        transport.write_line(b"PLAY\n").await.unwrap();
        transport.shutdown().await;

        // Assert
        assert_eq!(accept.await.unwrap(), b"PLAY\n");
    }

    #[tokio::test]
    async fn test_open_on_closed_port_is_refused() {
        let port = unused_port().await;

        let result = TcpConnector::new().open("127.0.0.1", port, TIMEOUT).await;

        assert!(matches!(result, Err(ConnectionError::Refused { port: p, .. }) if p == port));
    }

    #[tokio::test]
    async fn test_open_unresolvable_host_is_resolve_error() {
        let result = TcpConnector::new()
            .open("no-such-host.invalid", 2048, TIMEOUT)
            .await;

        assert!(matches!(
            result,
            Err(ConnectionError::Resolve { .. }) | Err(ConnectionError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_after_peer_close_reports_peer_closed() {
        // Arrange
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut transport = TcpConnector::new()
            .open("127.0.0.1", port, TIMEOUT)
            .await
            .unwrap();
        let (socket, _) = listener.accept().await.unwrap();

        // Act
        drop(socket);
        drop(listener);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let result = transport.write_line(b"STOP\n").await;

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_classify_maps_refused_and_other_errors() {
        let refused = classify(
            "box",
            2048,
            std::io::Error::from(ErrorKind::ConnectionRefused),
        );
        assert!(matches!(refused, ConnectionError::Refused { port: 2048, .. }));

        let other = classify("box", 2048, std::io::Error::from(ErrorKind::TimedOut));
        assert!(matches!(other, ConnectionError::Io { .. }));
    }
}
