//! Protocol module - wire format, framing, and message types.
//!
//! This module implements the receive side of the serial protocol:
//! - Wire constants and 7-bit packing helpers
//! - Framer that finds message boundaries in a byte stream
//! - Receive buffer for accumulating partial reads
//! - Message enum with typed accessors

mod framer;
mod message;
mod receive_buffer;
mod wire_format;

pub use framer::{classify, locate_next, Framing};
pub use message::Message;
pub use receive_buffer::{ReceiveBuffer, DEFAULT_MAX_BUFFERED};
pub use wire_format::{
    command, is_start_byte, join_14, join_21, pack_pairs, split_14, split_21, sysex,
    to_signed_14, unpack_pairs, ANALOG_CHANNEL_COUNT, DATA_MASK, MAX_14BIT, PIN_COUNT,
    START_BIT,
};
