//! Receive buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` so consumed bytes are advanced past instead of
//! shifted by hand. After every drain pass the buffer holds exactly the
//! unconsumed tail: either nothing, or one incomplete message starting at
//! index 0.
//!
//! # Example
//!
//! ```
//! use mbfirmata_client::protocol::{Message, ReceiveBuffer};
//!
//! let mut buffer = ReceiveBuffer::new();
//!
//! // Version report split across two serial reads
//! assert!(buffer.push(&[0xF9, 2]).unwrap().is_empty());
//! let messages = buffer.push(&[6]).unwrap();
//!
//! assert_eq!(messages, vec![Message::VersionReport { major: 2, minor: 6 }]);
//! ```

use bytes::{Buf, BytesMut};

use super::framer::{classify, locate_next, Framing};
use super::Message;
use crate::error::{FirmataError, Result};

/// Default initial capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// Default cap on unconsumed bytes (64 KiB).
pub const DEFAULT_MAX_BUFFERED: usize = 64 * 1024;

/// Buffer for accumulating incoming bytes and extracting complete messages.
#[derive(Debug)]
pub struct ReceiveBuffer {
    /// Unconsumed bytes from serial reads.
    buffer: BytesMut,
    /// Maximum unconsumed bytes held between pushes.
    max_buffered: usize,
}

impl ReceiveBuffer {
    /// Create a new receive buffer with default settings.
    pub fn new() -> Self {
        Self::with_max_buffered(DEFAULT_MAX_BUFFERED)
    }

    /// Create a new receive buffer with a custom cap.
    pub fn with_max_buffered(max_buffered: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(DEFAULT_CAPACITY.min(max_buffered)),
            max_buffered,
        }
    }

    /// Push data into the buffer and extract all complete messages.
    ///
    /// Malformed and stray spans are consumed without producing a message.
    /// An incomplete trailing message stays buffered for the next push.
    ///
    /// # Errors
    ///
    /// See [`push_into`](Self::push_into).
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        self.push_into(data, &mut messages)?;
        Ok(messages)
    }

    /// Push data and append every complete message to `out`.
    ///
    /// `data` is fed in slices no larger than the free room, draining after
    /// each one, so the cap bounds only the unconsumed tail and never the
    /// size of a single delivery.
    ///
    /// # Errors
    ///
    /// Returns [`FirmataError::BufferOverflow`] once a single incomplete
    /// message fills the cap while input remains. `incoming` is the number
    /// of bytes that were not accepted. Messages completed before that
    /// point are already in `out`.
    pub fn push_into(&mut self, data: &[u8], out: &mut Vec<Message>) -> Result<()> {
        let mut rest = data;

        while !rest.is_empty() {
            let room = self.max_buffered.saturating_sub(self.buffer.len());
            if room == 0 {
                tracing::warn!(
                    buffered = self.buffer.len(),
                    incoming = rest.len(),
                    limit = self.max_buffered,
                    "receive buffer overflow"
                );
                return Err(FirmataError::BufferOverflow {
                    buffered: self.buffer.len(),
                    incoming: rest.len(),
                    limit: self.max_buffered,
                });
            }

            let (slice, tail) = rest.split_at(room.min(rest.len()));
            self.buffer.extend_from_slice(slice);
            self.drain(out);
            rest = tail;
        }

        Ok(())
    }

    /// Extract complete messages and compact the tail to index 0.
    fn drain(&mut self, out: &mut Vec<Message>) {
        let mut cursor = 0;

        loop {
            let Some(start) = locate_next(&self.buffer, cursor) else {
                // Only data bytes left: nothing can ever claim them.
                self.buffer.clear();
                return;
            };

            match classify(&self.buffer, start) {
                Framing::Incomplete => {
                    self.buffer.advance(start);
                    return;
                }
                Framing::Complete(len) => {
                    let span = &self.buffer[start..start + len];
                    match Message::from_span(span) {
                        Some(message) => out.push(message),
                        None => tracing::debug!(
                            status = span[0],
                            len,
                            "skipping malformed extended message"
                        ),
                    }
                    cursor = start + len;
                }
            }
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get the configured cap.
    pub fn max_buffered(&self) -> usize {
        self.max_buffered
    }

    /// Discard all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Get the unconsumed bytes for debugging.
    #[cfg(test)]
    fn pending(&self) -> &[u8] {
        &self.buffer
    }
}

impl Default for ReceiveBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::wire_format::sysex;

    #[test]
    fn test_single_complete_message() {
        let mut buffer = ReceiveBuffer::new();

        let messages = buffer.push(&[0xF9, 2, 5]).unwrap();

        assert_eq!(messages, vec![Message::VersionReport { major: 2, minor: 5 }]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_messages_in_one_push() {
        let mut buffer = ReceiveBuffer::new();

        let data = [0x91, 0x05, 0x00, 0xE2, 0x10, 0x01, 0xF0, 0x01, 0xF7];
        let messages = buffer.push(&data).unwrap();

        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], Message::ChannelCommand { channel: 1, .. }));
        assert!(matches!(messages[1], Message::ChannelCommand { channel: 2, .. }));
        assert_eq!(messages[2].subtype(), Some(sysex::DISPLAY_CLEAR));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_incomplete_tail_is_compacted_to_start() {
        let mut buffer = ReceiveBuffer::new();

        let messages = buffer.push(&[0xF9, 2, 5, 0x03, 0xF0, 0x0D, 1]).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(buffer.pending(), &[0xF0, 0x0D, 1]);

        let messages = buffer.push(&[0, 0, 2, 0, 0, 0xF7]).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].payload(), Some(&[1, 0, 0, 2, 0, 0][..]));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_leading_data_bytes_discarded() {
        let mut buffer = ReceiveBuffer::new();

        let messages = buffer.push(&[0x01, 0x02, 0x03]).unwrap();
        assert!(messages.is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = ReceiveBuffer::new();
        let data = [0xF0, sysex::DEBUG_STRING, b'o', b'k', 0xF7];

        let mut all = Vec::new();
        for byte in &data {
            all.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].payload(), Some(&b"ok"[..]));
    }

    #[test]
    fn test_malformed_extended_does_not_block() {
        let mut buffer = ReceiveBuffer::new();

        let messages = buffer.push(&[0xF0, 0x0D, 0xF9, 2, 5]).unwrap();

        assert_eq!(messages, vec![Message::VersionReport { major: 2, minor: 5 }]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_overflow_when_one_message_fills_cap() {
        let mut buffer = ReceiveBuffer::with_max_buffered(8);

        buffer.push(&[0xF0, 0x0E, b'a', b'b']).unwrap();
        assert_eq!(buffer.len(), 4);

        let result = buffer.push(&[b'c'; 5]);
        assert!(matches!(
            result,
            Err(FirmataError::BufferOverflow {
                buffered: 8,
                incoming: 1,
                limit: 8
            })
        ));
        assert_eq!(buffer.pending(), b"\xF0\x0Eabcccc");
    }

    #[test]
    fn test_exact_fit_completes() {
        let mut buffer = ReceiveBuffer::with_max_buffered(8);

        buffer.push(&[0xF0, 0x0E, b'a', b'b']).unwrap();
        let messages = buffer.push(&[b'c', b'd', b'e', 0xF7]).unwrap();

        assert_eq!(messages[0].payload(), Some(&b"abcde"[..]));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_large_delivery_of_complete_messages() {
        let mut buffer = ReceiveBuffer::with_max_buffered(1024);
        let data: Vec<u8> = [0xE0, 0x05, 0x00].repeat(30_000);

        let whole = buffer.push(&data).unwrap();

        let mut chunked = Vec::new();
        let mut other = ReceiveBuffer::with_max_buffered(1024);
        for chunk in data.chunks(1000) {
            other.push_into(chunk, &mut chunked).unwrap();
        }

        assert_eq!(whole.len(), 30_000);
        assert_eq!(whole, chunked);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_overflow_keeps_messages_before_it() {
        let mut buffer = ReceiveBuffer::with_max_buffered(6);
        let mut out = Vec::new();

        let data = [0xF9, 2, 6, 0xF0, 0x0E, b'a', b'b', b'c', b'd', b'e'];
        let result = buffer.push_into(&data, &mut out);

        assert!(matches!(result, Err(FirmataError::BufferOverflow { .. })));
        assert_eq!(out, vec![Message::VersionReport { major: 2, minor: 6 }]);
    }

    #[test]
    fn test_clear() {
        let mut buffer = ReceiveBuffer::new();
        buffer.push(&[0xE0, 0x01]).unwrap();
        assert_eq!(buffer.len(), 2);

        buffer.clear();

        assert!(buffer.is_empty());
        assert!(buffer.push(&[0x02]).unwrap().is_empty());
    }
}
