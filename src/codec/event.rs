//! Decoded events produced from complete messages.

use serde::Serialize;

/// A typed event decoded from one complete message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecodedEvent {
    /// Eight pins of one digital port.
    DigitalPortUpdate { port: u8, mask: u16 },
    /// Signed 14-bit sample of an analog channel.
    AnalogChannelUpdate { channel: u8, value: i16 },
    /// Firmata protocol version.
    ProtocolVersion { major: u8, minor: u8 },
    /// Firmware name and version.
    FirmwareVersion { major: u8, minor: u8, name: String },
    /// Board event such as a button press or gesture.
    DeviceEvent { source_id: u32, event_id: u32 },
    /// Diagnostic text from the board.
    DebugText { text: String },
}

