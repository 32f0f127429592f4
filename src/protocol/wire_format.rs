//! Wire format constants and 7-bit packing helpers.
//!
//! Every byte on the wire either starts a message (bit 7 set) or carries
//! seven bits of argument data (bit 7 clear):
//! ```text
//! Channel command:   ┌────────────────────┬───────┬───────┐
//!                    │ command | channel  │ arg1  │ arg2  │
//!                    │ hi nibble  lo nib. │ 7 bit │ 7 bit │
//!                    └────────────────────┴───────┴───────┘
//! Extended command:  ┌──────┬─────────┬─────────────┬──────┐
//!                    │ 0xF0 │ subtype │ payload ... │ 0xF7 │
//!                    └──────┴─────────┴─────────────┴──────┘
//! ```
//!
//! Multi-byte values are split into 7-bit groups, least significant first.

/// Mask selecting the message-start bit.
pub const START_BIT: u8 = 0x80;

/// Mask selecting the payload bits of a data byte.
pub const DATA_MASK: u8 = 0x7F;

/// Number of tracked digital pins.
pub const PIN_COUNT: usize = 21;

/// Number of analog channels.
pub const ANALOG_CHANNEL_COUNT: usize = 16;

/// Largest value representable in two 7-bit data bytes.
pub const MAX_14BIT: u16 = 0x3FFF;

/// Channel command classes (high nibble) and standalone status bytes.
pub mod command {
    /// Enable/disable streaming of an analog channel.
    pub const STREAM_ANALOG: u8 = 0xC0;
    /// Enable/disable tracking of a digital port.
    pub const STREAM_DIGITAL: u8 = 0xD0;
    /// Analog channel update.
    pub const ANALOG_UPDATE: u8 = 0xE0;
    /// Digital port update.
    pub const DIGITAL_UPDATE: u8 = 0x90;

    /// Extended command start marker.
    pub const SYSEX_START: u8 = 0xF0;
    /// Set pin mode.
    pub const SET_PIN_MODE: u8 = 0xF4;
    /// Set a single digital pin.
    pub const SET_DIGITAL_PIN: u8 = 0xF5;
    /// Extended command terminator.
    pub const SYSEX_END: u8 = 0xF7;
    /// Request/report Firmata protocol version.
    pub const FIRMATA_VERSION: u8 = 0xF9;
    /// Reset the board.
    pub const SYSTEM_RESET: u8 = 0xFF;

    /// Mask selecting the command class.
    pub const CLASS_MASK: u8 = 0xF0;
    /// Mask selecting the channel/port.
    pub const CHANNEL_MASK: u8 = 0x0F;

    /// Number of argument bytes a channel command needs when no later
    /// start byte bounds it.
    #[inline]
    pub fn required_args(status: u8) -> usize {
        if status == SYSTEM_RESET {
            return 0;
        }
        match status & CLASS_MASK {
            STREAM_ANALOG | STREAM_DIGITAL => 1,
            _ => 2,
        }
    }
}

/// Extended command sub-types.
pub mod sysex {
    /// Clear the display.
    pub const DISPLAY_CLEAR: u8 = 0x01;
    /// Show a full 5x5 image.
    pub const DISPLAY_SHOW: u8 = 0x02;
    /// Set a single pixel.
    pub const DISPLAY_PLOT: u8 = 0x03;
    /// Scroll a string.
    pub const SCROLL_STRING: u8 = 0x04;
    /// Scroll an integer.
    pub const SCROLL_INTEGER: u8 = 0x05;
    /// Touch mode on/off for pins 0-2.
    pub const SET_TOUCH_MODE: u8 = 0x06;
    /// Display on/off.
    pub const DISPLAY_ENABLE: u8 = 0x07;
    /// Board event report (source id, event id).
    pub const REPORT_EVENT: u8 = 0x0D;
    /// Debug string from the board.
    pub const DEBUG_STRING: u8 = 0x0E;

    /// Analog write to any pin.
    pub const EXTENDED_ANALOG_WRITE: u8 = 0x6F;
    /// Request/report firmware name and version.
    pub const REPORT_FIRMWARE: u8 = 0x79;
    /// Milliseconds between streamed analog samples.
    pub const SAMPLING_INTERVAL: u8 = 0x7A;
}

/// Check if a byte starts a message.
#[inline]
pub fn is_start_byte(byte: u8) -> bool {
    byte & START_BIT != 0
}

/// Split a 14-bit value into `(low, high)` 7-bit data bytes.
#[inline]
pub fn split_14(value: u16) -> [u8; 2] {
    [(value as u8) & DATA_MASK, ((value >> 7) as u8) & DATA_MASK]
}

/// Join two 7-bit data bytes into a 14-bit value.
#[inline]
pub fn join_14(low: u8, high: u8) -> u16 {
    u16::from(low & DATA_MASK) | (u16::from(high & DATA_MASK) << 7)
}

/// Join three 7-bit data bytes into a 21-bit value.
#[inline]
pub fn join_21(b0: u8, b1: u8, b2: u8) -> u32 {
    u32::from(b0 & DATA_MASK) | (u32::from(b1 & DATA_MASK) << 7) | (u32::from(b2 & DATA_MASK) << 14)
}

/// Split a 21-bit value into three 7-bit data bytes.
#[inline]
pub fn split_21(value: u32) -> [u8; 3] {
    [
        (value as u8) & DATA_MASK,
        ((value >> 7) as u8) & DATA_MASK,
        ((value >> 14) as u8) & DATA_MASK,
    ]
}

/// Reinterpret a 14-bit value as two's complement.
///
/// 8191 stays 8191, 8192 becomes -8192, 16383 becomes -1.
#[inline]
pub fn to_signed_14(raw: u16) -> i16 {
    let raw = (raw & MAX_14BIT) as i16;
    if raw > 8191 {
        raw - 16384
    } else {
        raw
    }
}

/// Pack 8-bit bytes as `(low, high)` 7-bit pairs.
pub fn pack_pairs(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(b & DATA_MASK);
        out.push((b >> 7) & DATA_MASK);
    }
    out
}

/// Reassemble `(low, high)` 7-bit pairs into 8-bit bytes.
///
/// A trailing unpaired byte is ignored.
pub fn unpack_pairs(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(2)
        .map(|pair| (pair[0] & DATA_MASK) | (pair[1] << 7))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_byte_detection() {
        assert!(is_start_byte(0x80));
        assert!(is_start_byte(command::SYSEX_END));
        assert!(!is_start_byte(0x7F));
        assert!(!is_start_byte(0x00));
    }

    #[test]
    fn test_split_join_14() {
        assert_eq!(split_14(0), [0, 0]);
        assert_eq!(split_14(MAX_14BIT), [0x7F, 0x7F]);
        assert_eq!(split_14(1280), [0x00, 0x0A]);
        assert_eq!(join_14(0x00, 0x0A), 1280);
        assert_eq!(join_14(0x7F, 0x7F), MAX_14BIT);
    }

    #[test]
    fn test_join_21() {
        assert_eq!(join_21(1, 0, 0), 1);
        assert_eq!(join_21(0, 1, 0), 128);
        assert_eq!(join_21(0, 0, 1), 16384);
        assert_eq!(join_21(0x7F, 0x7F, 0x7F), 0x1F_FFFF);
        assert_eq!(split_21(3000), [56, 23, 0]);
        assert_eq!(join_21(56, 23, 0), 3000);
    }

    #[test]
    fn test_signed_14_boundaries() {
        assert_eq!(to_signed_14(0), 0);
        assert_eq!(to_signed_14(8191), 8191);
        assert_eq!(to_signed_14(8192), -8192);
        assert_eq!(to_signed_14(16383), -1);
    }

    #[test]
    fn test_required_args() {
        assert_eq!(command::required_args(command::SYSTEM_RESET), 0);
        assert_eq!(command::required_args(command::STREAM_ANALOG | 5), 1);
        assert_eq!(command::required_args(command::STREAM_DIGITAL | 2), 1);
        assert_eq!(command::required_args(command::ANALOG_UPDATE), 2);
        assert_eq!(command::required_args(command::FIRMATA_VERSION), 2);
    }

    #[test]
    fn test_pairs_preserve_high_bit() {
        let bytes = [0x00, 0x41, 0x7F, 0x80, 0xC3, 0xFF];
        let packed = pack_pairs(&bytes);
        assert_eq!(packed.len(), 12);
        assert!(packed.iter().all(|b| !is_start_byte(*b)));
        assert_eq!(unpack_pairs(&packed), bytes);
    }

    #[test]
    fn test_unpack_ignores_trailing_byte() {
        assert_eq!(unpack_pairs(&[0x41, 0x00, 0x42]), vec![0x41]);
        assert!(unpack_pairs(&[]).is_empty());
    }
}
