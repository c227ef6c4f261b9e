//! Pin device: the state gate in front of the remote pin agent.
//!
//! This crate turns the raw agent protocol into the device a supervisory
//! framework drives: one boolean `output` and `voltage` attribute per
//! reconciled pin, the `TurnOff`, `ResetAll` and `Init` commands, and an
//! `ON` / `OFF` / `FAULT` state that decides which of them may run.
//!
//! # Layers
//!
//! ```text
//! framework ──> PinDevice (gate, state machine, attribute table)
//!                   │
//!                   └─> PinClient (typed commands, fault wrapping, cache)
//!                           │
//!                           └─> Transport (TcpTransport / MockTransport)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pinlink_device::{DeviceConfig, PinDevice};
//! use pinlink_network::TcpTransport;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeviceConfig::new("raspberrypi.local");
//! let transport = TcpTransport::new(config.transport_config());
//!
//! let mut device = PinDevice::new(config, transport).await?;
//! println!("{}: {}", device.state(), device.status());
//!
//! device.write_attribute("pin3_output", true).await?;
//! device.write_attribute("pin3_voltage", true).await?;
//!
//! device.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod client;
pub mod config;
pub mod device;
pub mod state_machine;

pub use attributes::{AttrRequest, AttributeKind, AttributeTable, DeviceCommand, PinAttribute};
pub use client::PinClient;
pub use config::DeviceConfig;
pub use device::PinDevice;
pub use state_machine::{StateMachine, StateTransition};
