//! Command sink and inbound listeners
//!
//! Commands go out over one TCP stream as newline-delimited JSON
//! envelopes. Telemetry and captures arrive as JSON datagrams on separate
//! UDP sockets.

use crate::error::TransportError;
use crate::telemetry::{CaptureEvent, TelemetryCache, TelemetryFrame};
use dtc_script::CommandEnvelope;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Largest datagram accepted on the inbound channels
pub const MAX_DATAGRAM: usize = 64 * 1024;

/// Outbound command channel
///
/// Implementations deliver envelopes reliably and in order. A send either
/// completes or fails as a whole.
#[async_trait::async_trait]
pub trait CommandSink: Send {
    /// Deliver one envelope
    async fn send(&mut self, envelope: &CommandEnvelope) -> Result<(), TransportError>;
}

/// Command channel over TCP
#[derive(Debug)]
pub struct TcpCommandSink {
    stream: TcpStream,
    addr: String,
}

impl TcpCommandSink {
    /// Connect to the cockpit command port
    ///
    /// # Errors
    /// Returns [`TransportError::Connect`] or
    /// [`TransportError::ConnectTimeout`]
    pub async fn connect(addr: &str, timeout: Duration) -> Result<Self, TransportError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::ConnectTimeout {
                addr: addr.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })?
            .map_err(|source| TransportError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;
        tracing::info!(%addr, "command channel connected");
        Ok(Self {
            stream,
            addr: addr.to_string(),
        })
    }

    /// Remote address
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait::async_trait]
impl CommandSink for TcpCommandSink {
    async fn send(&mut self, envelope: &CommandEnvelope) -> Result<(), TransportError> {
        let line = envelope.to_line()?;
        self.stream.write_all(line.as_bytes()).await.map_err(|err| {
            tracing::error!(addr = %self.addr, error = %err, "command channel write failed");
            match err.kind() {
                std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => {
                    TransportError::Closed
                }
                _ => TransportError::Io(err),
            }
        })?;
        self.stream.flush().await?;
        Ok(())
    }
}

/// Bind a UDP socket for an inbound channel
///
/// # Errors
/// Returns [`TransportError::Bind`] if the address is unavailable
pub async fn bind_udp(addr: &str) -> Result<UdpSocket, TransportError> {
    UdpSocket::bind(addr)
        .await
        .map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Fold telemetry datagrams into `cache` until the task is aborted
pub fn spawn_telemetry_listener(socket: UdpSocket, cache: Arc<TelemetryCache>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let len = match socket.recv(&mut buf).await {
                Ok(len) => len,
                Err(err) => {
                    tracing::error!(error = %err, "telemetry socket failed");
                    break;
                }
            };
            match serde_json::from_slice::<TelemetryFrame>(&buf[..len]) {
                Ok(frame) => {
                    cache.update(frame);
                }
                Err(err) => tracing::warn!(error = %err, len, "malformed telemetry frame"),
            }
        }
    })
}

/// Forward capture datagrams to `tx` until the receiver is dropped
pub fn spawn_capture_listener(socket: UdpSocket, tx: mpsc::Sender<CaptureEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let len = match socket.recv(&mut buf).await {
                Ok(len) => len,
                Err(err) => {
                    tracing::error!(error = %err, "capture socket failed");
                    break;
                }
            };
            match serde_json::from_slice::<CaptureEvent>(&buf[..len]) {
                Ok(event) => {
                    tracing::debug!(lat = event.lat, lon = event.lon, "capture received");
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(err) => tracing::warn!(error = %err, len, "malformed capture event"),
            }
        }
    })
}
