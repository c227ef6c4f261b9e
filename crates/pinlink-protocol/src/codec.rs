//! Tokio codec for the pin agent protocol.
//!
//! `AgentCodec` plugs the agent protocol into Tokio's `Framed` streams:
//! - [`Encoder<Command>`]: renders a command in wire form (`5 SETOUTPUT True;`)
//! - [`Decoder`]: cuts the byte stream into [`Reply`] values
//!
//! # Reply framing
//!
//! The agent answers every command with exactly one write and no length
//! prefix. A reply ends at the first `;` or `\n`; bytes that arrive with
//! no terminator at all are taken as one whole reply. Line breaks right
//! after a reply are consumed with it. A blank line that answers a pending
//! command is an empty reply (an agent with no pins answers `READPINSLIST;`
//! that way, or with a bare `;`); blank lines with nothing pending are
//! skipped.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use pinlink_core::PinId;
//! use pinlink_protocol::{AgentCodec, Command};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//!
//! # async fn example() -> pinlink_core::Result<()> {
//! let stream = TcpStream::connect("raspberrypi.local:9788").await?;
//! let mut framed = Framed::new(stream, AgentCodec::new());
//!
//! framed.send(Command::ReadVoltage(PinId::new(3)?)).await?;
//! if let Some(Ok(reply)) = framed.next().await {
//!     println!("pin 3 voltage: {reply}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Decoding fails when a reply exceeds the maximum size or is not valid
//! UTF-8. The error names the command that was last encoded, which is the
//! one the reply answers since only one request is ever in flight.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::{Command, Reply};
use pinlink_core::constants::{COMMAND_TERMINATOR, LINE_TERMINATOR, MAX_REPLY_SIZE};
use pinlink_core::{Error, Result};

/// Tokio codec pairing agent commands with their replies.
#[derive(Debug)]
pub struct AgentCodec {
    /// Maximum allowed reply size in bytes.
    max_reply_size: usize,

    /// Command most recently encoded; the next reply answers it.
    in_flight: Option<Command>,
}

impl AgentCodec {
    /// Create a new codec with the default maximum reply size (64 KB).
    pub fn new() -> Self {
        Self::with_max_reply_size(MAX_REPLY_SIZE)
    }

    /// Create a new codec with a custom maximum reply size.
    ///
    /// # Example
    ///
    /// ```
    /// use pinlink_protocol::AgentCodec;
    ///
    /// let codec = AgentCodec::with_max_reply_size(256);
    /// assert_eq!(codec.max_reply_size(), 256);
    /// ```
    pub fn with_max_reply_size(max_reply_size: usize) -> Self {
        Self {
            max_reply_size,
            in_flight: None,
        }
    }

    /// Get the current maximum reply size.
    pub fn max_reply_size(&self) -> usize {
        self.max_reply_size
    }

    /// Command awaiting its reply, if any.
    pub fn in_flight(&self) -> Option<&Command> {
        self.in_flight.as_ref()
    }

    fn in_flight_label(&self) -> String {
        self.in_flight
            .map(|command| command.to_wire())
            .unwrap_or_else(|| "<no request>".to_string())
    }
}

impl Default for AgentCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn is_terminator(byte: u8) -> bool {
    byte == COMMAND_TERMINATOR as u8 || byte == LINE_TERMINATOR as u8
}

impl Decoder for AgentCodec {
    type Item = Reply;
    type Error = Error;

    /// Decode one reply from the byte stream.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Reply))` - A reply was decoded
    /// - `Ok(None)` - The buffer is empty or held only blank lines with no
    ///   command pending
    /// - `Err(Error)` - The reply is too large or not UTF-8
    ///
    /// # Example
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use tokio_util::codec::Decoder;
    /// use pinlink_protocol::AgentCodec;
    ///
    /// let mut codec = AgentCodec::new();
    /// let mut buffer = BytesMut::from(&b"True;\n"[..]);
    ///
    /// let reply = codec.decode(&mut buffer).unwrap().unwrap();
    /// assert_eq!(reply.as_str(), "True");
    /// ```
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            if src.is_empty() {
                return Ok(None);
            }

            let end = src.iter().position(|&b| is_terminator(b));
            let frame_len = end.map_or(src.len(), |i| i + 1);

            if frame_len > self.max_reply_size {
                return Err(Error::ReplyTooLarge {
                    size: frame_len,
                    max_size: self.max_reply_size,
                });
            }

            let frame = src.split_to(frame_len);
            let explicit_end = frame.last() == Some(&(COMMAND_TERMINATOR as u8));

            let text = std::str::from_utf8(&frame).map_err(|_| {
                Error::invalid_reply(
                    self.in_flight_label(),
                    String::from_utf8_lossy(&frame).into_owned(),
                )
            })?;

            let reply = Reply::new(text);
            if reply.is_empty() && !explicit_end && self.in_flight.is_none() {
                continue;
            }

            // Line breaks trailing a reply belong to it, not to the next request
            let trailing = src.iter().take_while(|&&b| b == b'\r' || b == b'\n').count();
            let _ = src.split_to(trailing);

            self.in_flight = None;
            return Ok(Some(reply));
        }
    }
}

impl Encoder<Command> for AgentCodec {
    type Error = Error;

    /// Encode a command in wire form.
    ///
    /// # Example
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use tokio_util::codec::Encoder;
    /// use pinlink_protocol::{AgentCodec, Command};
    ///
    /// let mut codec = AgentCodec::new();
    /// let mut buffer = BytesMut::new();
    /// codec.encode(Command::AllOff, &mut buffer).unwrap();
    /// assert_eq!(&buffer[..], b"ALL OFF;");
    /// ```
    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<()> {
        let wire = item.to_wire();
        dst.reserve(wire.len());
        dst.extend_from_slice(wire.as_bytes());
        self.in_flight = Some(item);
        Ok(())
    }
}
