//! Scripted in-memory agent for testing without a board.
//!
//! [`MockTransport`] answers each command from a table keyed by the exact
//! wire form of the request, and records every request it receives. A
//! request without a scripted reply is answered with `True`.
//!
//! The paired [`MockTransportHandle`] stays with the test and scripts
//! replies, injects failures and inspects the request history after the
//! transport has been moved into a client.
//!
//! # Examples
//!
//! ```
//! use pinlink_core::PinId;
//! use pinlink_network::{MockTransport, Transport};
//! use pinlink_protocol::Command;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (mut transport, handle) = MockTransport::new();
//!     handle.set_reply("3 READVOLTAGE;", "False");
//!
//!     transport.connect("board", 9788).await?;
//!     let reply = transport
//!         .send_and_receive(Command::ReadVoltage(PinId::new(3)?))
//!         .await?;
//!
//!     assert_eq!(reply.as_str(), "False");
//!     assert_eq!(handle.history(), vec!["3 READVOLTAGE;"]);
//!     Ok(())
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pinlink_core::constants::WIRE_TRUE;
use pinlink_protocol::{Command, Reply};
use tracing::debug;

use crate::transport::{ConnectionError, Transport};

#[derive(Debug, Default)]
struct MockAgent {
    replies: HashMap<String, String>,
    history: Vec<String>,
    connects: Vec<(String, u16)>,
    disconnects: usize,
    connected: bool,
    refuse_connect: bool,
    fail_next: usize,
    fail_on: HashSet<String>,
}

#[derive(Debug, Clone, Default)]
struct Shared(Arc<Mutex<MockAgent>>);

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MockAgent> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mock [`Transport`] backed by a scripted reply table.
#[derive(Debug)]
pub struct MockTransport {
    agent: Shared,
}

impl MockTransport {
    /// Create a disconnected mock transport and its control handle.
    pub fn new() -> (Self, MockTransportHandle) {
        let agent = Shared::default();
        (
            Self {
                agent: agent.clone(),
            },
            MockTransportHandle { agent },
        )
    }
}

impl Transport for MockTransport {
    async fn connect(&mut self, host: &str, port: u16) -> Result<(), ConnectionError> {
        let mut agent = self.agent.lock();
        agent.connects.push((host.to_string(), port));

        if agent.refuse_connect {
            agent.connected = false;
            return Err(ConnectionError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused by mock agent",
            )));
        }

        agent.connected = true;
        debug!(host, port, "Mock transport connected");
        Ok(())
    }

    async fn disconnect(&mut self) {
        let mut agent = self.agent.lock();
        if agent.connected {
            agent.connected = false;
            agent.disconnects += 1;
        }
    }

    async fn send_and_receive(&mut self, command: Command) -> Result<Reply, ConnectionError> {
        let mut agent = self.agent.lock();
        if !agent.connected {
            return Err(ConnectionError::NotConnected);
        }

        let request = command.to_wire();
        agent.history.push(request.clone());

        let fail = if agent.fail_next > 0 {
            agent.fail_next -= 1;
            true
        } else {
            agent.fail_on.contains(&request)
        };
        if fail {
            agent.connected = false;
            return Err(ConnectionError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "broken pipe",
            )));
        }

        let reply = agent
            .replies
            .get(&request)
            .map(String::as_str)
            .unwrap_or(WIRE_TRUE);
        Ok(Reply::new(reply))
    }

    fn is_connected(&self) -> bool {
        self.agent.lock().connected
    }
}

/// Test-side control of a [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    agent: Shared,
}

impl MockTransportHandle {
    /// Answer `request` (exact wire form, e.g. `"3 READOUTPUT;"`) with `reply`.
    pub fn set_reply(&self, request: &str, reply: &str) {
        self.agent
            .lock()
            .replies
            .insert(request.to_string(), reply.to_string());
    }

    /// Every request received so far, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.agent.lock().history.clone()
    }

    /// Number of times `request` was received.
    pub fn count(&self, request: &str) -> usize {
        self.agent
            .lock()
            .history
            .iter()
            .filter(|r| r.as_str() == request)
            .count()
    }

    pub fn clear_history(&self) {
        self.agent.lock().history.clear();
    }

    /// Refuse (or accept again) subsequent connection attempts.
    pub fn refuse_connections(&self, refuse: bool) {
        self.agent.lock().refuse_connect = refuse;
    }

    /// Fail the next `count` round trips with a broken pipe.
    pub fn fail_next(&self, count: usize) {
        self.agent.lock().fail_next = count;
    }

    /// Fail every round trip that sends `request`.
    pub fn fail_on(&self, request: &str) {
        self.agent.lock().fail_on.insert(request.to_string());
    }

    /// Stop failing round trips for `request`.
    pub fn stop_failing(&self, request: &str) {
        self.agent.lock().fail_on.remove(request);
    }

    /// Connection attempts as `(host, port)`, oldest first.
    pub fn connects(&self) -> Vec<(String, u16)> {
        self.agent.lock().connects.clone()
    }

    /// Number of disconnects that released an open connection.
    pub fn disconnects(&self) -> usize {
        self.agent.lock().disconnects
    }

    pub fn is_connected(&self) -> bool {
        self.agent.lock().connected
    }
}
