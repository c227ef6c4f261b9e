//! Requests understood by the pin agent.
//!
//! Every command is a pure function of its arguments: rendering the same
//! [`Command`] twice always produces the same bytes.
//!
//! | Command | Wire form | Reply |
//! |---------|-----------|-------|
//! | [`Command::ReadOutput`] | `{P} READOUTPUT;` | boolean |
//! | [`Command::SetOutput`] | `{P} SETOUTPUT {V};` | boolean ack |
//! | [`Command::ReadVoltage`] | `{P} READVOLTAGE;` | boolean |
//! | [`Command::SetVoltage`] | `{P} SETVOLTAGE {V};` | boolean ack |
//! | [`Command::ReadPinsList`] | `READPINSLIST;` | comma separated integers |
//! | [`Command::AllOff`] | `ALL OFF;` | boolean ack |
//! | [`Command::AllReset`] | `ALL RESET;` | boolean ack |
//!
//! # Examples
//!
//! ```
//! use pinlink_core::PinId;
//! use pinlink_protocol::Command;
//!
//! let pin = PinId::new(5).unwrap();
//! assert_eq!(Command::SetOutput(pin, true).to_wire(), "5 SETOUTPUT True;");
//! assert_eq!(Command::ReadPinsList.to_wire(), "READPINSLIST;");
//! ```

use std::fmt;

use pinlink_core::PinId;
use pinlink_core::constants::{COMMAND_TERMINATOR, WIRE_FALSE, WIRE_TRUE};
use serde::{Deserialize, Serialize};

/// A single request to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Query whether a pin is configured as an output.
    ReadOutput(PinId),

    /// Configure a pin as output (`true`) or input (`false`).
    SetOutput(PinId, bool),

    /// Query the logic level of a pin.
    ReadVoltage(PinId),

    /// Drive a pin high or low. Only valid on output pins.
    SetVoltage(PinId, bool),

    /// Enumerate the pins the agent exposes.
    ReadPinsList,

    /// De-energize every pin and disable the board.
    AllOff,

    /// Return every pin to its power-on configuration.
    AllReset,
}

impl Command {
    /// Pin addressed by this command, if any.
    pub fn pin(&self) -> Option<PinId> {
        match self {
            Command::ReadOutput(pin)
            | Command::SetOutput(pin, _)
            | Command::ReadVoltage(pin)
            | Command::SetVoltage(pin, _) => Some(*pin),
            Command::ReadPinsList | Command::AllOff | Command::AllReset => None,
        }
    }

    /// Render the command, terminator included.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

/// Wire spelling of a boolean argument.
pub fn wire_bool(value: bool) -> &'static str {
    if value { WIRE_TRUE } else { WIRE_FALSE }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ReadOutput(pin) => write!(f, "{pin} READOUTPUT"),
            Command::SetOutput(pin, value) => write!(f, "{pin} SETOUTPUT {}", wire_bool(*value)),
            Command::ReadVoltage(pin) => write!(f, "{pin} READVOLTAGE"),
            Command::SetVoltage(pin, value) => {
                write!(f, "{pin} SETVOLTAGE {}", wire_bool(*value))
            }
            Command::ReadPinsList => write!(f, "READPINSLIST"),
            Command::AllOff => write!(f, "ALL OFF"),
            Command::AllReset => write!(f, "ALL RESET"),
        }?;
        write!(f, "{COMMAND_TERMINATOR}")
    }
}
