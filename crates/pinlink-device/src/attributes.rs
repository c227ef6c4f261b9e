//! Attribute and command table exposed to the supervisory framework.
//!
//! Each reconciled pin contributes two boolean attributes, `pin{P}_output`
//! and `pin{P}_voltage`. The table is rebuilt after every successful
//! reconciliation and resolves a name to a [`PinAttribute`] record, which
//! dispatches on its [`AttributeKind`] to the matching [`PinClient`] call.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use pinlink_core::{Error, PinId, PinSet, Result};
use pinlink_network::Transport;
use serde::{Deserialize, Serialize};

use crate::client::PinClient;

/// Which pin property an attribute maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Whether the pin drives a signal (`true`) or senses one.
    OutputMode,

    /// Logic level of the pin.
    Voltage,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 2] = [AttributeKind::OutputMode, AttributeKind::Voltage];

    fn suffix(&self) -> &'static str {
        match self {
            AttributeKind::OutputMode => "output",
            AttributeKind::Voltage => "voltage",
        }
    }

    /// Attribute name for `pin`, e.g. `pin3_voltage`.
    pub fn attribute_name(&self, pin: PinId) -> String {
        format!("pin{pin}_{}", self.suffix())
    }
}

/// Kind of access the framework asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrRequest {
    Read,
    Write,
}

impl fmt::Display for AttrRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrRequest::Read => write!(f, "Read"),
            AttrRequest::Write => write!(f, "Write"),
        }
    }
}

/// One boolean attribute bound to a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinAttribute {
    pub pin: PinId,
    pub kind: AttributeKind,
}

impl PinAttribute {
    pub fn new(pin: PinId, kind: AttributeKind) -> Self {
        Self { pin, kind }
    }

    pub fn name(&self) -> String {
        self.kind.attribute_name(self.pin)
    }

    pub async fn read<T: Transport>(&self, client: &mut PinClient<T>) -> Result<bool> {
        match self.kind {
            AttributeKind::OutputMode => client.read_output(self.pin).await,
            AttributeKind::Voltage => client.read_voltage(self.pin).await,
        }
    }

    /// Write `value`, returning the agent's acknowledgement.
    pub async fn write<T: Transport>(&self, client: &mut PinClient<T>, value: bool) -> Result<bool> {
        match self.kind {
            AttributeKind::OutputMode => client.set_output(self.pin, value).await,
            AttributeKind::Voltage => client.set_voltage(self.pin, value).await,
        }
    }
}

/// Name-to-record mapping for every attribute of the reconciled pins.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    entries: BTreeMap<String, PinAttribute>,
}

impl AttributeTable {
    /// Build the table for `pins`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pinlink_core::PinSet;
    /// use pinlink_device::{AttributeKind, AttributeTable};
    ///
    /// let table = AttributeTable::build(&PinSet::from_numbers([3, 5]).unwrap());
    ///
    /// assert_eq!(table.len(), 4);
    /// assert_eq!(table.get("pin5_voltage").unwrap().kind, AttributeKind::Voltage);
    /// assert!(table.get("pin7_voltage").is_none());
    /// ```
    pub fn build(pins: &PinSet) -> Self {
        let entries = pins
            .iter()
            .flat_map(|pin| AttributeKind::ALL.map(|kind| PinAttribute::new(pin, kind)))
            .map(|attribute| (attribute.name(), attribute))
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<PinAttribute> {
        self.entries.get(name).copied()
    }

    /// Resolve `name` or fail with `Error::UnknownAttribute`.
    pub fn resolve(&self, name: &str) -> Result<PinAttribute> {
        self.get(name)
            .ok_or_else(|| Error::UnknownAttribute(name.to_string()))
    }

    /// Attribute names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parameterless commands the framework can execute on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceCommand {
    /// Send `ALL OFF;` and move to `OFF`.
    TurnOff,

    /// Send `ALL RESET;`; the device state does not change.
    ResetAll,

    /// Reconnect and reconcile the pin set.
    Init,
}

impl DeviceCommand {
    /// Whether the command may only run while the device is `ON`.
    pub fn requires_on(&self) -> bool {
        !matches!(self, DeviceCommand::Init)
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceCommand::TurnOff => "TurnOff",
            DeviceCommand::ResetAll => "ResetAll",
            DeviceCommand::Init => "Init",
        };
        write!(f, "{name}")
    }
}

impl FromStr for DeviceCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "TurnOff" => Ok(DeviceCommand::TurnOff),
            "ResetAll" => Ok(DeviceCommand::ResetAll),
            "Init" => Ok(DeviceCommand::Init),
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinlink_network::MockTransport;
    use rstest::rstest;

    #[test]
    fn test_attribute_names() {
        let pin = PinId::new(12).unwrap();
        assert_eq!(AttributeKind::OutputMode.attribute_name(pin), "pin12_output");
        assert_eq!(AttributeKind::Voltage.attribute_name(pin), "pin12_voltage");
    }

    #[test]
    fn test_table_covers_every_pin() {
        let table = AttributeTable::build(&PinSet::from_numbers([3, 10]).unwrap());

        let names: Vec<&str> = table.names().collect();
        assert_eq!(
            names,
            vec!["pin10_output", "pin10_voltage", "pin3_output", "pin3_voltage"]
        );
    }

    #[test]
    fn test_empty_table() {
        let table = AttributeTable::build(&PinSet::new());
        assert!(table.is_empty());
        assert!(matches!(
            table.resolve("pin3_output"),
            Err(Error::UnknownAttribute(_))
        ));
    }

    #[rstest]
    #[case("TurnOff", DeviceCommand::TurnOff)]
    #[case("ResetAll", DeviceCommand::ResetAll)]
    #[case(" Init ", DeviceCommand::Init)]
    fn test_command_from_str(#[case] input: &str, #[case] expected: DeviceCommand) {
        let command: DeviceCommand = input.parse().unwrap();
        assert_eq!(command, expected);
        assert_eq!(command.to_string(), input.trim());
    }

    #[rstest]
    #[case("turnoff")]
    #[case("Reboot")]
    #[case("")]
    fn test_unknown_command(#[case] input: &str) {
        assert!(matches!(
            input.parse::<DeviceCommand>(),
            Err(Error::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_only_init_runs_outside_on() {
        assert!(DeviceCommand::TurnOff.requires_on());
        assert!(DeviceCommand::ResetAll.requires_on());
        assert!(!DeviceCommand::Init.requires_on());
    }

    #[tokio::test]
    async fn test_attribute_dispatch() {
        let (transport, handle) = MockTransport::new();
        let mut client = PinClient::new(transport);
        client.connect("board", 9788).await.unwrap();
        client.set_pins(PinSet::from_numbers([5]).unwrap());

        let table = AttributeTable::build(client.pins());
        let output = table.resolve("pin5_output").unwrap();
        let voltage = table.resolve("pin5_voltage").unwrap();

        output.write(&mut client, true).await.unwrap();
        voltage.read(&mut client).await.unwrap();
        voltage.write(&mut client, false).await.unwrap();

        assert_eq!(
            handle.history(),
            vec![
                "5 SETOUTPUT True;",
                "5 READVOLTAGE;",
                "5 READOUTPUT;",
                "5 SETVOLTAGE False;",
            ]
        );
    }
}
