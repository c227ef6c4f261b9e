//! Typed pin operations over a [`Transport`].
//!
//! `PinClient` is the single place where transport failures become
//! [`Error::ConnectionFault`]. Every operation goes through `round_trip`,
//! which never retries: one failed exchange ends the operation and the
//! fault is handed up for the device to act on.

use std::collections::HashMap;

use pinlink_core::{Error, PinId, PinSet, PinState, Result};
use pinlink_network::Transport;
use pinlink_protocol::{Command, Reply};
use tracing::{debug, trace, warn};

/// Client for the pin agent, owning the transport exclusively.
///
/// # Examples
///
/// ```
/// use pinlink_core::{PinId, PinSet};
/// use pinlink_device::PinClient;
/// use pinlink_network::MockTransport;
///
/// #[tokio::main]
/// async fn main() -> pinlink_core::Result<()> {
///     let (transport, handle) = MockTransport::new();
///     handle.set_reply("3 READVOLTAGE;", "False");
///
///     let mut client = PinClient::new(transport);
///     client.connect("board", 9788).await?;
///     client.set_pins(PinSet::from_numbers([3])?);
///
///     assert!(!client.read_voltage(PinId::new(3)?).await?);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct PinClient<T> {
    transport: T,

    /// Reconciled pins; operations on any other pin are refused.
    pins: PinSet,

    /// Last values read per pin.
    cache: HashMap<PinId, PinState>,
}

impl<T: Transport> PinClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            pins: PinSet::new(),
            cache: HashMap::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    /// Replace the reconciled pin set and forget every cached value.
    pub fn set_pins(&mut self, pins: PinSet) {
        self.pins = pins;
        self.cache.clear();
    }

    /// Last values read from `pin`, if it was ever read.
    pub fn cached_state(&self, pin: PinId) -> Option<PinState> {
        self.cache.get(&pin).copied()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Open the connection to the agent.
    ///
    /// # Errors
    /// Returns `Error::ConnectionFault` if the agent cannot be reached.
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        self.transport
            .connect(host, port)
            .await
            .map_err(|e| Error::ConnectionFault(format!("{host}:{port}: {e}")))
    }

    /// Release the connection; a no-op when not connected.
    pub async fn disconnect(&mut self) {
        self.transport.disconnect().await;
    }

    async fn round_trip(&mut self, command: Command) -> Result<Reply> {
        match self.transport.send_and_receive(command).await {
            Ok(reply) => {
                trace!(command = %command, reply = %reply, "Round trip completed");
                Ok(reply)
            }
            Err(e) => {
                warn!(command = %command, "Round trip failed: {}", e);
                Err(Error::ConnectionFault(e.to_string()))
            }
        }
    }

    async fn round_trip_bool(&mut self, command: Command) -> Result<bool> {
        self.round_trip(command).await?.as_bool(&command)
    }

    fn check_pin(&self, pin: PinId) -> Result<()> {
        if self.pins.contains(pin) {
            Ok(())
        } else {
            Err(Error::UnknownPin(pin))
        }
    }

    /// Query whether `pin` is configured as an output.
    pub async fn read_output(&mut self, pin: PinId) -> Result<bool> {
        self.check_pin(pin)?;
        let output = self.round_trip_bool(Command::ReadOutput(pin)).await?;
        self.cache.entry(pin).or_default().output_mode = Some(output);
        Ok(output)
    }

    /// Configure `pin` as output or input. Returns the agent's acknowledgement.
    pub async fn set_output(&mut self, pin: PinId, value: bool) -> Result<bool> {
        self.check_pin(pin)?;
        self.round_trip_bool(Command::SetOutput(pin, value)).await
    }

    /// Query the logic level of `pin`.
    pub async fn read_voltage(&mut self, pin: PinId) -> Result<bool> {
        self.check_pin(pin)?;
        let voltage = self.round_trip_bool(Command::ReadVoltage(pin)).await?;
        self.cache.entry(pin).or_default().voltage = Some(voltage);
        Ok(voltage)
    }

    /// Drive `pin` high or low.
    ///
    /// The output mode is read from the agent first; the cache is never
    /// trusted for this decision. A falsy acknowledgement of the write is
    /// still a completed round trip and is returned as `Ok(false)`.
    ///
    /// # Errors
    /// Returns `Error::OutputNotConfigured` without sending `SETVOLTAGE`
    /// when the pin is not an output.
    pub async fn set_voltage(&mut self, pin: PinId, value: bool) -> Result<bool> {
        if !self.read_output(pin).await? {
            debug!(pin = %pin, "Refusing voltage write on a pin that is not an output");
            return Err(Error::OutputNotConfigured { pin });
        }

        let ack = self.round_trip_bool(Command::SetVoltage(pin, value)).await?;
        if !ack {
            debug!(pin = %pin, value, "Agent acknowledged voltage write with false");
        }
        Ok(ack)
    }

    /// Pins the agent exposes.
    pub async fn list_available_pins(&mut self) -> Result<PinSet> {
        let command = Command::ReadPinsList;
        self.round_trip(command).await?.as_pin_set(&command)
    }

    /// De-energize every pin and disable the board.
    pub async fn turn_off(&mut self) -> Result<bool> {
        self.round_trip_bool(Command::AllOff).await
    }

    /// Return every pin to its power-on configuration.
    pub async fn reset_all(&mut self) -> Result<bool> {
        self.round_trip_bool(Command::AllReset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinlink_network::{MockTransport, MockTransportHandle};

    fn pin(n: u16) -> PinId {
        PinId::new(n).unwrap()
    }

    async fn connected_client(pins: &[u16]) -> (PinClient<MockTransport>, MockTransportHandle) {
        let (transport, handle) = MockTransport::new();
        let mut client = PinClient::new(transport);
        client.connect("board", 9788).await.unwrap();
        client.set_pins(PinSet::from_numbers(pins.iter().copied()).unwrap());
        (client, handle)
    }

    #[tokio::test]
    async fn test_read_voltage_sends_single_command() {
        let (mut client, handle) = connected_client(&[3, 5]).await;
        handle.set_reply("3 READVOLTAGE;", "False");

        let voltage = client.read_voltage(pin(3)).await.unwrap();

        assert!(!voltage);
        assert_eq!(handle.history(), vec!["3 READVOLTAGE;"]);
        assert_eq!(client.cached_state(pin(3)).unwrap().voltage, Some(false));
    }

    #[tokio::test]
    async fn test_set_output_is_unconditional() {
        let (mut client, handle) = connected_client(&[5]).await;

        client.set_output(pin(5), true).await.unwrap();

        assert_eq!(handle.history(), vec!["5 SETOUTPUT True;"]);
    }

    #[tokio::test]
    async fn test_set_voltage_checks_output_first() {
        let (mut client, handle) = connected_client(&[7]).await;
        handle.set_reply("7 READOUTPUT;", "True");

        client.set_voltage(pin(7), false).await.unwrap();

        assert_eq!(handle.history(), vec!["7 READOUTPUT;", "7 SETVOLTAGE False;"]);
        assert_eq!(client.cached_state(pin(7)).unwrap().output_mode, Some(true));
    }

    #[tokio::test]
    async fn test_set_voltage_refused_on_input_pin() {
        let (mut client, handle) = connected_client(&[7]).await;
        handle.set_reply("7 READOUTPUT;", "False");

        let result = client.set_voltage(pin(7), true).await;

        assert!(matches!(result, Err(Error::OutputNotConfigured { .. })));
        assert_eq!(handle.count("7 SETVOLTAGE True;"), 0);
    }

    #[tokio::test]
    async fn test_set_voltage_ignores_stale_cache() {
        let (mut client, handle) = connected_client(&[7]).await;
        handle.set_reply("7 READOUTPUT;", "True");
        client.read_output(pin(7)).await.unwrap();

        // The pin was switched to input behind our back
        handle.set_reply("7 READOUTPUT;", "False");
        let result = client.set_voltage(pin(7), true).await;

        assert!(matches!(result, Err(Error::OutputNotConfigured { .. })));
        assert_eq!(handle.count("7 READOUTPUT;"), 2);
    }

    #[tokio::test]
    async fn test_falsy_voltage_ack_is_success() {
        let (mut client, handle) = connected_client(&[8]).await;
        handle.set_reply("8 SETVOLTAGE True;", "False");

        let ack = client.set_voltage(pin(8), true).await.unwrap();

        assert!(!ack);
    }

    #[tokio::test]
    async fn test_unknown_pin_sends_nothing() {
        let (mut client, handle) = connected_client(&[3]).await;

        let result = client.read_output(pin(99)).await;

        assert!(matches!(result, Err(Error::UnknownPin(p)) if p == pin(99)));
        assert!(handle.history().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_connection_fault() {
        let (mut client, handle) = connected_client(&[3]).await;
        handle.fail_next(1);

        let result = client.read_voltage(pin(3)).await;

        assert!(matches!(result, Err(Error::ConnectionFault(_))));
        assert_eq!(handle.count("3 READVOLTAGE;"), 1);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_not_a_fault() {
        let (mut client, handle) = connected_client(&[3]).await;
        handle.set_reply("3 READOUTPUT;", "maybe");

        let result = client.read_output(pin(3)).await;

        assert!(matches!(result, Err(Error::InvalidReply { .. })));
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn test_list_available_pins() {
        let (mut client, handle) = connected_client(&[]).await;
        handle.set_reply("READPINSLIST;", "3,5,7,8,10,11,12,13,15,16");

        let pins = client.list_available_pins().await.unwrap();

        assert_eq!(pins.len(), 10);
        assert!(pins.contains(pin(16)));
    }

    #[tokio::test]
    async fn test_board_wide_commands() {
        let (mut client, handle) = connected_client(&[]).await;

        assert!(client.turn_off().await.unwrap());
        assert!(client.reset_all().await.unwrap());

        assert_eq!(handle.history(), vec!["ALL OFF;", "ALL RESET;"]);
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_fault() {
        let (transport, handle) = MockTransport::new();
        handle.refuse_connections(true);
        let mut client = PinClient::new(transport);

        let result = client.connect("board", 9788).await;

        assert!(matches!(result, Err(Error::ConnectionFault(msg)) if msg.starts_with("board:9788")));
    }

    #[tokio::test]
    async fn test_set_pins_clears_cache() {
        let (mut client, _handle) = connected_client(&[3]).await;
        client.read_voltage(pin(3)).await.unwrap();

        client.set_pins(PinSet::from_numbers([3]).unwrap());

        assert!(client.cached_state(pin(3)).is_none());
    }
}
