//! Network transport to the pin agent.
//!
//! This crate owns the single TCP connection to the agent on the board and
//! performs strictly one request/reply round trip at a time.
//!
//! # Components
//!
//! - **Transport**: the seam the pin client talks through
//! - **TcpTransport**: `Transport` over a Tokio `TcpStream` framed with `AgentCodec`
//! - **MockTransport**: scripted in-memory agent for tests
//!
//! # Example
//!
//! ```no_run
//! use pinlink_network::{TcpTransport, Transport, TransportConfig};
//! use pinlink_protocol::Command;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut transport = TcpTransport::new(TransportConfig::default());
//! transport.connect("raspberrypi.local", 9788).await?;
//!
//! let reply = transport.send_and_receive(Command::ReadPinsList).await?;
//! println!("pins: {reply}");
//!
//! transport.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod mock;
mod tcp;
mod transport;

pub use mock::{MockTransport, MockTransportHandle};
pub use tcp::TcpTransport;
pub use transport::{ConnectionError, Transport, TransportConfig};
