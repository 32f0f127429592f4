//! Command decoder - turns complete messages into typed events.
//!
//! Unknown opcodes and sub-types decode to `None`. The framer has already
//! consumed their bytes, so skipping them here is all that is needed.

use crate::protocol::{command, join_14, join_21, sysex, to_signed_14, unpack_pairs, Message};

use super::DecodedEvent;

/// Payload length of a device event report (two 21-bit ids).
pub const DEVICE_EVENT_PAYLOAD_LEN: usize = 6;

/// Decoder for incoming messages.
pub struct CommandDecoder;

impl CommandDecoder {
    /// Decode a message into an event.
    ///
    /// Returns `None` for messages that carry no event.
    pub fn decode(message: &Message) -> Option<DecodedEvent> {
        match message {
            Message::VersionReport { major, minor } => Some(DecodedEvent::ProtocolVersion {
                major: *major,
                minor: *minor,
            }),
            Message::ChannelCommand {
                opcode,
                channel,
                arg1,
                arg2,
            } => Self::decode_channel(*opcode, *channel, *arg1, *arg2),
            Message::ExtendedCommand { subtype, payload } => {
                Self::decode_extended(*subtype, payload)
            }
        }
    }

    fn decode_channel(opcode: u8, channel: u8, arg1: u8, arg2: u8) -> Option<DecodedEvent> {
        match opcode {
            command::DIGITAL_UPDATE => Some(DecodedEvent::DigitalPortUpdate {
                port: channel,
                mask: join_14(arg1, arg2),
            }),
            command::ANALOG_UPDATE => Some(DecodedEvent::AnalogChannelUpdate {
                channel,
                value: to_signed_14(join_14(arg1, arg2)),
            }),
            _ => {
                tracing::trace!(opcode, channel, "ignoring channel command");
                None
            }
        }
    }

    fn decode_extended(subtype: u8, payload: &[u8]) -> Option<DecodedEvent> {
        match subtype {
            sysex::REPORT_EVENT => Self::decode_device_event(payload),
            sysex::DEBUG_STRING => Some(DecodedEvent::DebugText {
                text: String::from_utf8_lossy(payload).into_owned(),
            }),
            sysex::REPORT_FIRMWARE => Self::decode_firmware_report(payload),
            _ => {
                tracing::trace!(subtype, len = payload.len(), "ignoring extended command");
                None
            }
        }
    }

    fn decode_device_event(payload: &[u8]) -> Option<DecodedEvent> {
        let Some(ids) = payload.get(..DEVICE_EVENT_PAYLOAD_LEN) else {
            tracing::debug!(len = payload.len(), "short device event report");
            return None;
        };
        Some(DecodedEvent::DeviceEvent {
            source_id: join_21(ids[0], ids[1], ids[2]),
            event_id: join_21(ids[3], ids[4], ids[5]),
        })
    }

    fn decode_firmware_report(payload: &[u8]) -> Option<DecodedEvent> {
        let [major, minor, name @ ..] = payload else {
            tracing::debug!(len = payload.len(), "short firmware report");
            return None;
        };
        let name = String::from_utf8_lossy(&unpack_pairs(name)).into_owned();
        Some(DecodedEvent::FirmwareVersion {
            major: *major,
            minor: *minor,
            name,
        })
    }
}
