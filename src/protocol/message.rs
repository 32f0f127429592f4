//! Message struct with typed accessors.
//!
//! A [`Message`] is the framed view of one complete message: a channel
//! command, an extended command, or a version report. It is built from the
//! exact byte span the framer classified as complete.
//!
//! # Example
//!
//! ```
//! use mbfirmata_client::protocol::Message;
//!
//! let msg = Message::from_span(&[0xF9, 2, 6]).unwrap();
//! assert_eq!(msg, Message::VersionReport { major: 2, minor: 6 });
//! ```

use bytes::Bytes;

use super::wire_format::command;

/// One complete protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Status byte with a channel/port in its low nibble.
    ChannelCommand {
        /// Command class (high nibble, low nibble cleared).
        opcode: u8,
        /// Channel or port (0-15).
        channel: u8,
        /// First argument byte (0 if absent).
        arg1: u8,
        /// Second argument byte (0 if absent).
        arg2: u8,
    },
    /// `SYSEX_START subtype payload... SYSEX_END`.
    ExtendedCommand {
        /// Sub-type selector.
        subtype: u8,
        /// Payload between the sub-type and the terminator.
        payload: Bytes,
    },
    /// Firmata protocol version report.
    VersionReport { major: u8, minor: u8 },
}

impl Message {
    /// Build a message from a complete byte span.
    ///
    /// Returns `None` for spans that carry no message: malformed extended
    /// commands (no terminator) and stray terminators.
    pub fn from_span(span: &[u8]) -> Option<Self> {
        let (&status, args) = span.split_first()?;

        match status {
            command::SYSEX_START => {
                let (&last, body) = args.split_last()?;
                if last != command::SYSEX_END {
                    return None;
                }
                let (&subtype, payload) = body.split_first()?;
                Some(Message::ExtendedCommand {
                    subtype,
                    payload: Bytes::copy_from_slice(payload),
                })
            }
            command::SYSEX_END => None,
            command::FIRMATA_VERSION => Some(Message::VersionReport {
                major: args.first().copied().unwrap_or(0),
                minor: args.get(1).copied().unwrap_or(0),
            }),
            _ => Some(Message::ChannelCommand {
                opcode: status & command::CLASS_MASK,
                channel: status & command::CHANNEL_MASK,
                arg1: args.first().copied().unwrap_or(0),
                arg2: args.get(1).copied().unwrap_or(0),
            }),
        }
    }

    /// Check if this is an extended command.
    #[inline]
    pub fn is_extended(&self) -> bool {
        matches!(self, Message::ExtendedCommand { .. })
    }

    /// Get the extended sub-type, if any.
    #[inline]
    pub fn subtype(&self) -> Option<u8> {
        match self {
            Message::ExtendedCommand { subtype, .. } => Some(*subtype),
            _ => None,
        }
    }

    /// Get the extended payload, if any.
    #[inline]
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Message::ExtendedCommand { payload, .. } => Some(payload),
            _ => None,
        }
    }
}
