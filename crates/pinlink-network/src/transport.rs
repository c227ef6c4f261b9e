//! Transport contract between the pin client and the agent.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use pinlink_core::constants::DEFAULT_IO_TIMEOUT_MS;
use pinlink_protocol::{Command, Reply};
use thiserror::Error;

/// Configuration for a transport.
///
/// # Example
///
/// ```
/// use pinlink_network::TransportConfig;
/// use std::time::Duration;
///
/// let config = TransportConfig {
///     timeout: Duration::from_millis(500),
/// };
/// assert_eq!(config.timeout.as_millis(), 500);
/// ```
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout for all I/O operations (connect, send, recv)
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_IO_TIMEOUT_MS),
        }
    }
}

/// Every way a round trip to the agent can fail.
///
/// Callers treat all variants alike: the connection is gone and the device
/// must be re-initialized. The variants exist for diagnostics only.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Transport is not connected to the agent
    #[error("Not connected to agent")]
    NotConnected,

    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Read operation timed out
    #[error("Read timeout after {0}ms")]
    ReadTimeout(u64),

    /// Write operation timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Connection was lost during operation
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Reply could not be framed (oversized or not UTF-8)
    #[error("Protocol error: {0}")]
    Protocol(pinlink_core::Error),

    /// Low-level I/O error (refused, reset, broken pipe)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<pinlink_core::Error> for ConnectionError {
    fn from(error: pinlink_core::Error) -> Self {
        match error {
            pinlink_core::Error::Io(io) => ConnectionError::Io(io),
            other => ConnectionError::Protocol(other),
        }
    }
}

/// One exclusively owned connection to the agent.
///
/// `send_and_receive` is not reentrant: the agent pairs replies with
/// requests purely by arrival order, so exactly one request may be in
/// flight. Implementations take `&mut self` to make that a borrow rule.
pub trait Transport {
    /// Open the connection to `host:port`.
    async fn connect(&mut self, host: &str, port: u16) -> Result<(), ConnectionError>;

    /// Release the connection. Safe to call when not connected.
    async fn disconnect(&mut self);

    /// Send one command and wait for its single reply.
    async fn send_and_receive(&mut self, command: Command) -> Result<Reply, ConnectionError>;

    /// Whether a connection is currently held.
    fn is_connected(&self) -> bool;
}
