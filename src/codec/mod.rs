//! Codec module - translation between messages and typed commands/events.
//!
//! - [`CommandDecoder`] - complete [`Message`](crate::protocol::Message) to [`DecodedEvent`]
//! - [`CommandEncoder`] - typed requests to outbound frames
//!
//! # Design
//!
//! Codecs are marker structs with static methods rather than trait objects.
//! Neither side holds state; board state lives in [`crate::dispatch`].
//!
//! # Example
//!
//! ```
//! use mbfirmata_client::codec::{CommandDecoder, CommandEncoder, DecodedEvent};
//! use mbfirmata_client::protocol::Message;
//!
//! let frame = CommandEncoder::display_plot(1, 1, 200).unwrap();
//! assert_eq!(&frame[..], &[0xF0, 0x03, 1, 1, 100, 0xF7]);
//!
//! let event = CommandDecoder::decode(&Message::VersionReport { major: 2, minor: 6 });
//! assert_eq!(event, Some(DecodedEvent::ProtocolVersion { major: 2, minor: 6 }));
//! ```

mod decoder;
mod encoder;
mod event;

pub use decoder::{CommandDecoder, DEVICE_EVENT_PAYLOAD_LEN};
pub use encoder::{
    CommandEncoder, PinMode, DEFAULT_SCROLL_DELAY, DISPLAY_SIZE, LIGHT_SENSOR_CHANNEL,
    MAX_SCROLL_CHARS,
};
pub use event::DecodedEvent;
