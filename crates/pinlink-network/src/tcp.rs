//! TCP transport to the pin agent.
//!
//! # Architecture
//!
//! ```text
//! PinDevice
//!     │
//!     └─> PinClient
//!             │
//!             └─> TcpTransport ───(TCP :9788)───> Agent on the board
//!                    │
//!                    └─> AgentCodec (command / reply framing)
//! ```
//!
//! # Design Principles
//!
//! - **No automatic retry**: a failed round trip is terminal for the operation
//! - **No pipelining**: one request in flight, replies paired by order
//! - **Timeouts everywhere**: connect, send and receive share one timeout
//!
//! A stalled agent therefore holds the caller until the timeout fires, at
//! which point the failure surfaces as a [`ConnectionError`].

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, trace, warn};

use pinlink_core::constants::DISCONNECT_TIMEOUT_MS;
use pinlink_protocol::{AgentCodec, Command, Reply};

use crate::transport::{ConnectionError, Transport, TransportConfig};

/// [`Transport`] over a Tokio `TcpStream`.
///
/// # Connection Lifecycle
///
/// 1. Create transport with `new()`
/// 2. Connect to the agent with `connect()`
/// 3. Exchange commands with `send_and_receive()`
/// 4. Release the socket with `disconnect()`; dropping the transport also
///    closes the socket
///
/// # Example
///
/// ```no_run
/// use pinlink_network::{TcpTransport, Transport, TransportConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut transport = TcpTransport::new(TransportConfig::default());
/// transport.connect("10.0.0.7", 9788).await?;
/// assert!(transport.is_connected());
///
/// transport.disconnect().await;
/// assert!(!transport.is_connected());
/// # Ok(())
/// # }
/// ```
pub struct TcpTransport {
    /// Agent address as `host:port`, kept for diagnostics
    peer: Option<String>,

    /// Framed TCP stream with AgentCodec (None if not connected)
    framed: Option<Framed<TcpStream, AgentCodec>>,

    /// Timeout for all I/O operations
    timeout: Duration,
}

impl TcpTransport {
    /// Create a new, disconnected transport.
    ///
    /// # Example
    ///
    /// ```
    /// use pinlink_network::{TcpTransport, Transport, TransportConfig};
    ///
    /// let transport = TcpTransport::new(TransportConfig::default());
    /// assert!(!transport.is_connected());
    /// ```
    pub fn new(config: TransportConfig) -> Self {
        Self {
            peer: None,
            framed: None,
            timeout: config.timeout,
        }
    }

    /// Address of the agent this transport last connected to.
    pub fn peer(&self) -> Option<&str> {
        self.peer.as_deref()
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Drop the stream after a failed round trip so the next call reports
    /// `NotConnected` instead of reading a reply meant for an earlier request.
    fn abandon(&mut self) {
        if self.framed.take().is_some() {
            debug!("Abandoning connection after failed round trip");
        }
    }
}

impl Transport for TcpTransport {
    async fn connect(&mut self, host: &str, port: u16) -> Result<(), ConnectionError> {
        // A previous connection is never reused
        self.disconnect().await;

        let peer = format!("{host}:{port}");
        debug!(peer = %peer, timeout_ms = self.timeout_ms(), "Opening agent socket");

        let stream = match tokio::time::timeout(self.timeout, TcpStream::connect((host, port))).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                error!(peer = %peer, "Agent socket refused: {}", e);
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    peer = %peer,
                    timeout_ms = self.timeout_ms(),
                    "Agent did not accept in time"
                );
                return Err(ConnectionError::ConnectionTimeout(self.timeout_ms()));
            }
        };

        // Each command is one short write followed by a blocking read
        if let Err(e) = stream.set_nodelay(true) {
            warn!(peer = %peer, "Could not disable Nagle on agent socket: {}", e);
        }

        info!(peer = %peer, "Agent socket open");
        self.framed = Some(Framed::new(stream, AgentCodec::new()));
        self.peer = Some(peer);
        Ok(())
    }

    async fn disconnect(&mut self) {
        let Some(mut framed) = self.framed.take() else {
            return;
        };
        let peer = self.peer.as_deref().unwrap_or("agent");
        let grace = Duration::from_millis(DISCONNECT_TIMEOUT_MS);

        // Pending command bytes go out before the write half closes
        match tokio::time::timeout(grace, framed.flush()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(peer = %peer, "Pending bytes lost on close: {}", e),
            Err(_) => warn!(
                peer = %peer,
                grace_ms = DISCONNECT_TIMEOUT_MS,
                "Agent stopped reading before close"
            ),
        }

        let mut stream = framed.into_inner();
        match tokio::time::timeout(grace, stream.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(peer = %peer, "Agent socket shutdown failed: {}", e),
            Err(_) => warn!(
                peer = %peer,
                grace_ms = DISCONNECT_TIMEOUT_MS,
                "Agent socket shutdown stalled"
            ),
        }

        info!(peer = %peer, "Agent socket closed");
    }

    async fn send_and_receive(&mut self, command: Command) -> Result<Reply, ConnectionError> {
        trace!(command = %command, "Sending command to agent");

        let timeout = self.timeout;
        let timeout_ms = self.timeout_ms();
        let framed = self.framed.as_mut().ok_or(ConnectionError::NotConnected)?;

        let sent = match tokio::time::timeout(timeout, framed.send(command)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(command = %command, "Failed to send command: {}", e);
                Err(ConnectionError::from(e))
            }
            Err(_) => {
                warn!("Send timeout after {}ms", timeout_ms);
                Err(ConnectionError::WriteTimeout(timeout_ms))
            }
        };
        if let Err(e) = sent {
            self.abandon();
            return Err(e);
        }

        let received = match tokio::time::timeout(timeout, framed.next()).await {
            Ok(Some(Ok(reply))) => {
                trace!(command = %command, reply = %reply, "Received reply from agent");
                Ok(reply)
            }
            Ok(Some(Err(e))) => {
                error!(command = %command, "Failed to decode reply: {}", e);
                Err(ConnectionError::from(e))
            }
            Ok(None) => {
                warn!("Connection closed by agent");
                Err(ConnectionError::ConnectionLost(
                    "Agent closed connection".to_string(),
                ))
            }
            Err(_) => {
                warn!("Receive timeout after {}ms", timeout_ms);
                Err(ConnectionError::ReadTimeout(timeout_ms))
            }
        };
        if received.is_err() {
            self.abandon();
        }
        received
    }

    fn is_connected(&self) -> bool {
        self.framed.is_some()
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.framed.is_some() {
            debug!(peer = ?self.peer, "Transport dropped with the agent socket open");
        }
    }
}
