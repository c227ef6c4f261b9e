use thiserror::Error;

use crate::types::{DeviceState, PinId};

#[derive(Error, Debug)]
pub enum Error {
    // Connection errors
    #[error("Connection error: {0}")]
    ConnectionFault(String),

    // Request validation errors
    #[error("Pin must be setup as an output first (pin {pin})")]
    OutputNotConfigured { pin: PinId },

    #[error("Unknown pin: {0}")]
    UnknownPin(PinId),

    #[error("Invalid pin number: {0}")]
    InvalidPin(String),

    #[error("{operation} not allowed when the device is in {state} state")]
    NotAllowedInCurrentState {
        operation: String,
        state: DeviceState,
    },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: DeviceState, to: DeviceState },

    // Protocol errors
    #[error("Invalid reply to {command}: {reply:?}")]
    InvalidReply { command: String, reply: String },

    #[error("Reply of {size} bytes exceeds limit of {max_size} bytes")]
    ReplyTooLarge { size: usize, max_size: usize },

    // Framework boundary errors
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error must move the device into `FAULT`.
    pub fn is_connection_fault(&self) -> bool {
        matches!(self, Self::ConnectionFault(_))
    }

    pub fn not_allowed(operation: impl Into<String>, state: DeviceState) -> Self {
        Self::NotAllowedInCurrentState {
            operation: operation.into(),
            state,
        }
    }

    pub fn invalid_reply(command: impl ToString, reply: impl Into<String>) -> Self {
        Self::InvalidReply {
            command: command.to_string(),
            reply: reply.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_allowed_message() {
        let error = Error::not_allowed("Command TurnOff", DeviceState::Off);
        assert_eq!(
            error.to_string(),
            "Command TurnOff not allowed when the device is in OFF state"
        );
    }

    #[test]
    fn test_output_not_configured_message() {
        let error = Error::OutputNotConfigured {
            pin: PinId::new(3).unwrap(),
        };
        assert!(
            error
                .to_string()
                .contains("Pin must be setup as an output first")
        );
    }

    #[test]
    fn test_only_connection_fault_escalates() {
        assert!(Error::ConnectionFault("reset".into()).is_connection_fault());
        assert!(!Error::UnknownPin(PinId::new(4).unwrap()).is_connection_fault());
        assert!(!Error::invalid_reply("3 READOUTPUT;", "maybe").is_connection_fault());
    }
}
