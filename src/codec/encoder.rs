//! Command encoder - builds outbound frames.
//!
//! Every builder returns `Option<Bytes>`. `None` means the request was out
//! of range and no frame exists; a partial frame is never produced.
//!
//! # Example
//!
//! ```
//! use mbfirmata_client::codec::CommandEncoder;
//!
//! let frame = CommandEncoder::set_sampling_interval(1280).unwrap();
//! assert_eq!(&frame[..], &[0xF0, 0x7A, 0x00, 0x0A, 0xF7]);
//!
//! assert!(CommandEncoder::stream_analog_channel(16, true).is_none());
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::protocol::{command, split_14, split_21, sysex, DATA_MASK, MAX_14BIT, PIN_COUNT};

/// Longest string (in characters) sent by `scroll_string`.
pub const MAX_SCROLL_CHARS: usize = 100;

/// Default scroll delay in milliseconds per column.
pub const DEFAULT_SCROLL_DELAY: u8 = 120;

/// Display width and height.
pub const DISPLAY_SIZE: usize = 5;

/// Pins that support touch mode.
pub const TOUCH_PIN_COUNT: u8 = 3;

/// Analog channel wired to the light sensor.
pub const LIGHT_SENSOR_CHANNEL: u8 = 11;

/// Firmata pin modes supported by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PinMode {
    DigitalInput = 0x00,
    DigitalOutput = 0x01,
    AnalogInput = 0x02,
    Pwm = 0x03,
    InputPullup = 0x0B,
    /// Board extension; not part of standard Firmata.
    InputPulldown = 0x0F,
}

/// Encoder for outbound commands.
pub struct CommandEncoder;

impl CommandEncoder {
    // Version queries

    /// Ask for the Firmata protocol version.
    pub fn query_protocol_version() -> Bytes {
        Bytes::from_static(&[command::FIRMATA_VERSION, 0, 0])
    }

    /// Ask for the firmware name and version.
    pub fn query_firmware_version() -> Bytes {
        extended(sysex::REPORT_FIRMWARE, &[])
    }

    // Display

    /// Clear the display and stop any animation.
    pub fn display_clear() -> Bytes {
        extended(sysex::DISPLAY_CLEAR, &[])
    }

    /// Show a full 5x5 image.
    ///
    /// In grayscale mode pixel values are brightness 0-255, otherwise any
    /// non-zero value is on. Values above 1 are halved to fit 7 bits.
    pub fn display_show(grayscale: bool, pixels: &[[u8; DISPLAY_SIZE]; DISPLAY_SIZE]) -> Bytes {
        let mut payload = Vec::with_capacity(1 + DISPLAY_SIZE * DISPLAY_SIZE);
        payload.push(u8::from(grayscale));
        for row in pixels {
            for &pix in row {
                let level = if pix > 1 { pix / 2 } else { pix };
                payload.push(level & DATA_MASK);
            }
        }
        extended(sysex::DISPLAY_SHOW, &payload)
    }

    /// Set the pixel at `(x, y)` to a brightness of 0-255.
    pub fn display_plot(x: u8, y: u8, brightness: u8) -> Option<Bytes> {
        if usize::from(x) >= DISPLAY_SIZE || usize::from(y) >= DISPLAY_SIZE {
            return None;
        }
        Some(extended(
            sysex::DISPLAY_PLOT,
            &[x, y, (brightness / 2) & DATA_MASK],
        ))
    }

    /// Scroll a string across the display.
    ///
    /// Text beyond [`MAX_SCROLL_CHARS`] characters is dropped. Each UTF-8
    /// byte is sent as a `(low, high)` 7-bit pair.
    pub fn scroll_string(text: &str, delay: u8) -> Option<Bytes> {
        if delay > DATA_MASK {
            return None;
        }
        let end = text
            .char_indices()
            .nth(MAX_SCROLL_CHARS)
            .map_or(text.len(), |(i, _)| i);

        let mut payload = Vec::with_capacity(1 + end * 2);
        payload.push(delay);
        payload.extend(crate::protocol::pack_pairs(&text.as_bytes()[..end]));
        Some(extended(sysex::SCROLL_STRING, &payload))
    }

    /// Scroll a 32-bit integer across the display.
    ///
    /// The value travels as five 7-bit groups, least significant first.
    pub fn scroll_integer(n: i32, delay: u8) -> Option<Bytes> {
        if delay > DATA_MASK {
            return None;
        }
        let mut payload = [0u8; 6];
        payload[0] = delay;
        for (i, slot) in payload[1..].iter_mut().enumerate() {
            *slot = ((n >> (7 * i)) as u8) & DATA_MASK;
        }
        Some(extended(sysex::SCROLL_INTEGER, &payload))
    }

    /// Enable or disable the display.
    ///
    /// While the display is off, pins 0-5 are free for other uses. Turning
    /// it back on stops light sensing until the next light sensor request.
    pub fn enable_display(on: bool) -> Bytes {
        extended(sysex::DISPLAY_ENABLE, &[u8::from(on)])
    }

    // Subscriptions

    /// Start or stop tracking the digital port containing `pin`.
    pub fn track_digital_pin(pin: u8, on: bool) -> Option<Bytes> {
        if usize::from(pin) >= PIN_COUNT {
            return None;
        }
        Some(Bytes::copy_from_slice(&[
            command::STREAM_DIGITAL | (pin >> 3),
            u8::from(on),
        ]))
    }

    /// Start or stop streaming an analog channel.
    pub fn stream_analog_channel(channel: u8, on: bool) -> Option<Bytes> {
        if channel > command::CHANNEL_MASK {
            return None;
        }
        Some(Bytes::copy_from_slice(&[
            command::STREAM_ANALOG | channel,
            u8::from(on),
        ]))
    }

    /// Set the milliseconds (1-16383) between streamed analog samples.
    pub fn set_sampling_interval(millis: u16) -> Option<Bytes> {
        if millis == 0 || millis > MAX_14BIT {
            return None;
        }
        Some(extended(sysex::SAMPLING_INTERVAL, &split_14(millis)))
    }

    /// Turn touch mode on or off for pin 0-2.
    pub fn set_touch_mode(pin: u8, on: bool) -> Option<Bytes> {
        if pin >= TOUCH_PIN_COUNT {
            return None;
        }
        Some(extended(sysex::SET_TOUCH_MODE, &[pin, u8::from(on)]))
    }

    // Pins

    /// Set the mode of a pin.
    pub fn set_pin_mode(pin: u8, mode: PinMode) -> Option<Bytes> {
        if usize::from(pin) >= PIN_COUNT {
            return None;
        }
        Some(Bytes::copy_from_slice(&[
            command::SET_PIN_MODE,
            pin,
            mode as u8,
        ]))
    }

    /// Drive a digital output pin high or low.
    pub fn set_digital_output(pin: u8, on: bool) -> Option<Bytes> {
        if usize::from(pin) >= PIN_COUNT {
            return None;
        }
        Some(Bytes::copy_from_slice(&[
            command::SET_DIGITAL_PIN,
            pin,
            u8::from(on),
        ]))
    }

    /// Write a PWM value (0-16383) to a pin.
    ///
    /// Pins 0-15 use the two-byte channel form; higher pins need the
    /// extended analog write.
    pub fn set_analog_output(pin: u8, value: u16) -> Option<Bytes> {
        if usize::from(pin) >= PIN_COUNT || value > MAX_14BIT {
            return None;
        }
        if pin <= command::CHANNEL_MASK {
            let [lo, hi] = split_14(value);
            return Some(Bytes::copy_from_slice(&[
                command::ANALOG_UPDATE | pin,
                lo,
                hi,
            ]));
        }
        let [b0, b1, b2] = split_21(u32::from(value));
        Some(extended(sysex::EXTENDED_ANALOG_WRITE, &[pin, b0, b1, b2]))
    }

    /// Turn on the light sensor by putting its channel in analog input mode.
    pub fn enable_light_sensor() -> Bytes {
        Bytes::from_static(&[
            command::SET_PIN_MODE,
            LIGHT_SENSOR_CHANNEL,
            PinMode::AnalogInput as u8,
        ])
    }

    /// Reset pin modes, streaming and sampling interval on the board.
    pub fn system_reset() -> Bytes {
        Bytes::from_static(&[command::SYSTEM_RESET])
    }
}

/// Wrap a payload in extended command markers.
fn extended(subtype: u8, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + 3);
    buf.put_u8(command::SYSEX_START);
    buf.put_u8(subtype);
    buf.put_slice(payload);
    buf.put_u8(command::SYSEX_END);
    buf.freeze()
}
