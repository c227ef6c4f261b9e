//! Replies sent back by the pin agent.
//!
//! A [`Reply`] holds the text of one reply with surrounding whitespace and
//! the trailing terminator already removed. Interpreting it as a boolean,
//! an integer or a pin list happens on demand, because only the caller knows
//! which command the reply answers.

use std::fmt;

use pinlink_core::constants::{COMMAND_TERMINATOR, LIST_SEPARATOR};
use pinlink_core::{Error, PinId, PinSet, Result};

use crate::Command;

/// Text of a single agent reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reply(String);

impl Reply {
    /// Wrap raw reply text, stripping whitespace and a trailing `;`.
    pub fn new(text: impl AsRef<str>) -> Self {
        let text = text.as_ref().trim();
        let text = text.strip_suffix(COMMAND_TERMINATOR).unwrap_or(text).trim_end();
        Reply(text.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interpret the reply as a boolean.
    ///
    /// # Errors
    /// Returns `Error::InvalidReply` when the text is not one of
    /// `True`/`true`/`1` or `False`/`false`/`0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pinlink_protocol::{Command, Reply};
    ///
    /// assert!(Reply::new("True").as_bool(&Command::AllOff).unwrap());
    /// assert!(!Reply::new("0\n").as_bool(&Command::AllOff).unwrap());
    /// assert!(Reply::new("perhaps").as_bool(&Command::AllOff).is_err());
    /// ```
    pub fn as_bool(&self, command: &Command) -> Result<bool> {
        match self.0.as_str() {
            "True" | "true" | "1" => Ok(true),
            "False" | "false" | "0" => Ok(false),
            other => Err(Error::invalid_reply(command, other)),
        }
    }

    /// Interpret the reply as a signed decimal integer.
    pub fn as_int(&self, command: &Command) -> Result<i64> {
        self.0
            .parse()
            .map_err(|_| Error::invalid_reply(command, self.0.as_str()))
    }

    /// Interpret the reply as a comma separated list of pin numbers.
    ///
    /// An empty reply is an empty list.
    ///
    /// # Examples
    ///
    /// ```
    /// use pinlink_protocol::{Command, Reply};
    ///
    /// let pins = Reply::new("3,5,7,8,10").as_pin_set(&Command::ReadPinsList).unwrap();
    /// assert_eq!(pins.len(), 5);
    /// ```
    pub fn as_pin_set(&self, command: &Command) -> Result<PinSet> {
        if self.0.is_empty() {
            return Ok(PinSet::new());
        }
        self.0
            .split(LIST_SEPARATOR)
            .map(|item| {
                item.parse::<PinId>()
                    .map_err(|_| Error::invalid_reply(command, self.0.as_str()))
            })
            .collect()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("True", true)]
    #[case("true", true)]
    #[case("1", true)]
    #[case("True;", true)]
    #[case(" True\r\n", true)]
    #[case("False", false)]
    #[case("false", false)]
    #[case("0", false)]
    #[case("False;\n", false)]
    fn test_as_bool(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(Reply::new(text).as_bool(&Command::AllOff).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("yes")]
    #[case("TRUE!")]
    #[case("2")]
    fn test_as_bool_invalid(#[case] text: &str) {
        let result = Reply::new(text).as_bool(&Command::AllOff);
        assert!(matches!(result, Err(Error::InvalidReply { .. })));
    }

    #[test]
    fn test_invalid_reply_names_the_command() {
        let pin = PinId::new(3).unwrap();
        let err = Reply::new("garbage")
            .as_bool(&Command::ReadOutput(pin))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid reply to 3 READOUTPUT;: \"garbage\""
        );
    }

    #[test]
    fn test_as_int() {
        assert_eq!(Reply::new("42").as_int(&Command::AllOff).unwrap(), 42);
        assert_eq!(Reply::new("-1").as_int(&Command::AllOff).unwrap(), -1);
        assert!(Reply::new("4 2").as_int(&Command::AllOff).is_err());
    }

    #[test]
    fn test_as_pin_set_full_header() {
        let reply = Reply::new("3,5,7,8,10,11,12,13,15,16");
        let pins = reply.as_pin_set(&Command::ReadPinsList).unwrap();

        let numbers: Vec<u16> = pins.iter().map(|p| p.as_u16()).collect();
        assert_eq!(numbers, vec![3, 5, 7, 8, 10, 11, 12, 13, 15, 16]);
    }

    #[test]
    fn test_as_pin_set_tolerates_spaces() {
        let pins = Reply::new("3, 5 ,7;")
            .as_pin_set(&Command::ReadPinsList)
            .unwrap();
        assert_eq!(pins, PinSet::from_numbers([3, 5, 7]).unwrap());
    }

    #[test]
    fn test_as_pin_set_empty() {
        let pins = Reply::new("").as_pin_set(&Command::ReadPinsList).unwrap();
        assert!(pins.is_empty());
    }

    #[rstest]
    #[case("3,,5")]
    #[case("3,five")]
    #[case("0,3")]
    #[case("True")]
    fn test_as_pin_set_invalid(#[case] text: &str) {
        let result = Reply::new(text).as_pin_set(&Command::ReadPinsList);
        assert!(matches!(result, Err(Error::InvalidReply { .. })));
    }
}
