//! Protocol-level constants for the pin agent wire protocol.
//!
//! The agent on the board speaks a line-oriented ASCII protocol: every
//! request is a single command terminated by `;`, and every request is
//! answered by exactly one reply on the same stream.
//!
//! ```text
//! 5 SETOUTPUT True;      -> True
//! 5 READVOLTAGE;         -> False
//! READPINSLIST;          -> 3,5,7,8,10
//! ALL OFF;               -> True
//! ```
//!
//! # Usage
//!
//! ```
//! use pinlink_core::constants::*;
//!
//! assert_eq!(DEFAULT_AGENT_PORT, 9788);
//! assert_eq!(COMMAND_TERMINATOR, ';');
//! ```

// ============================================================================
// Framing
// ============================================================================

/// Terminates every command sent to the agent.
pub const COMMAND_TERMINATOR: char = ';';

/// Separates items in a list reply (`READPINSLIST`).
pub const LIST_SEPARATOR: char = ',';

/// Line terminator some agents append to replies.
pub const LINE_TERMINATOR: char = '\n';

/// Largest reply frame accepted from the agent, in bytes.
pub const MAX_REPLY_SIZE: usize = 64 * 1024;

// ============================================================================
// Boolean encoding
// ============================================================================

/// Wire spelling of a true value.
pub const WIRE_TRUE: &str = "True";

/// Wire spelling of a false value.
pub const WIRE_FALSE: &str = "False";

// ============================================================================
// Connection defaults
// ============================================================================

/// TCP port the agent listens on unless configured otherwise.
pub const DEFAULT_AGENT_PORT: u16 = 9788;

/// Timeout for connect, send and receive, in milliseconds.
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 3000;

/// Timeout applied to flush and shutdown while disconnecting, in milliseconds.
pub const DISCONNECT_TIMEOUT_MS: u64 = 500;

/// GPIO positions on the 40-pin header that are configured when no pin
/// list is given.
pub const DEFAULT_PINS: [u16; 14] = [3, 5, 7, 8, 10, 11, 12, 13, 15, 16, 32, 36, 38, 40];
