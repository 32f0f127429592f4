//! Message boundary detection.
//!
//! The framer never consumes anything itself. It answers two questions
//! about a buffer: where does the next message start, and is the message
//! starting there complete yet.

use super::wire_format::{command, is_start_byte};

/// Classification of the message at a start index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Message is complete and spans this many bytes (status byte included).
    Complete(usize),
    /// More bytes are needed.
    Incomplete,
}

/// Find the index of the next message-start byte at or after `from`.
#[inline]
pub fn locate_next(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .iter()
        .position(|&b| is_start_byte(b))
        .map(|offset| from + offset)
}

/// Classify the message whose status byte is at `start`.
///
/// # Panics
///
/// Panics if `start` is out of bounds.
pub fn classify(buf: &[u8], start: usize) -> Framing {
    let status = buf[start];
    let next = locate_next(buf, start + 1);

    match (status, next) {
        // Complete only if the next start byte is the terminator; any other
        // start byte means the terminator was lost and the span is skipped.
        (command::SYSEX_START, Some(next)) if buf[next] == command::SYSEX_END => {
            Framing::Complete(next - start + 1)
        }
        (command::SYSEX_START, Some(next)) => Framing::Complete(next - start),
        (command::SYSEX_START, None) => Framing::Incomplete,

        (command::SYSEX_END, None) => Framing::Complete(buf.len() - start),

        // Stream framing wins over nominal arity.
        (_, Some(next)) => Framing::Complete(next - start),
        (_, None) => {
            let available = buf.len() - start - 1;
            let needed = command::required_args(status);
            if available < needed {
                Framing::Incomplete
            } else {
                Framing::Complete(1 + needed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_next() {
        let buf = [0x01, 0x02, 0x90, 0x03, 0xF0];
        assert_eq!(locate_next(&buf, 0), Some(2));
        assert_eq!(locate_next(&buf, 2), Some(2));
        assert_eq!(locate_next(&buf, 3), Some(4));
        assert_eq!(locate_next(&buf, 5), None);
        assert_eq!(locate_next(&buf, 10), None);
        assert_eq!(locate_next(&[0x7F, 0x00], 0), None);
    }

    #[test]
    fn test_channel_command_complete() {
        assert_eq!(classify(&[0xE0, 0x01, 0x02], 0), Framing::Complete(3));
        assert_eq!(classify(&[0xF9, 2, 5], 0), Framing::Complete(3));
    }

    #[test]
    fn test_channel_command_incomplete() {
        assert_eq!(classify(&[0xE0], 0), Framing::Incomplete);
        assert_eq!(classify(&[0xE0, 0x01], 0), Framing::Incomplete);
        assert_eq!(classify(&[0xC2], 0), Framing::Incomplete);
    }

    #[test]
    fn test_required_count_when_unbounded() {
        // Extra trailing data bytes are not part of the message.
        assert_eq!(classify(&[0xE0, 1, 2, 3, 4], 0), Framing::Complete(3));
        assert_eq!(classify(&[0xC2, 1, 7], 0), Framing::Complete(2));
        assert_eq!(classify(&[0xFF], 0), Framing::Complete(1));
    }

    #[test]
    fn test_next_start_bounds_arguments() {
        // One argument, then a new message: arity is ignored.
        assert_eq!(classify(&[0xE0, 0x01, 0x90, 0, 0], 0), Framing::Complete(2));
        // Three arguments before the next message.
        assert_eq!(classify(&[0xE0, 1, 2, 3, 0xF9], 0), Framing::Complete(4));
    }

    #[test]
    fn test_extended_complete() {
        let buf = [0xF0, 0x0D, 1, 0, 0, 2, 0, 0, 0xF7];
        assert_eq!(classify(&buf, 0), Framing::Complete(9));

        let buf = [0x11, 0xF0, 0x01, 0xF7, 0x90];
        assert_eq!(classify(&buf, 1), Framing::Complete(3));
    }

    #[test]
    fn test_extended_incomplete() {
        assert_eq!(classify(&[0xF0], 0), Framing::Incomplete);
        assert_eq!(classify(&[0xF0, 0x0D, 1, 0, 0], 0), Framing::Incomplete);
    }

    #[test]
    fn test_extended_malformed_is_bounded_skip() {
        let buf = [0xF0, 0x0D, 1, 2, 0xF9, 2, 5];
        assert_eq!(classify(&buf, 0), Framing::Complete(4));
    }

    #[test]
    fn test_stray_terminator() {
        assert_eq!(classify(&[0xF7, 1, 2, 0x90], 0), Framing::Complete(3));
        assert_eq!(classify(&[0xF7, 1], 0), Framing::Complete(2));
        assert_eq!(classify(&[0xF7], 0), Framing::Complete(1));
    }
}
