//! Latched board state.
//!
//! Digital and analog slots hold the last value the board reported; version
//! strings are empty until the first report arrives.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::codec::DecodedEvent;
use crate::protocol::{ANALOG_CHANNEL_COUNT, PIN_COUNT};

/// Pins per digital port.
const PORT_WIDTH: usize = 8;

/// Snapshot of everything the board has reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardState {
    /// Digital input levels, one per pin.
    pub digital: [bool; PIN_COUNT],
    /// Signed 14-bit analog samples, one per channel.
    pub analog: [i16; ANALOG_CHANNEL_COUNT],
    /// e.g. `"Firmata Protocol 2.6"`.
    pub protocol_version: String,
    /// e.g. `"micro:bit Firmata 1.0"`.
    pub firmware_version: String,
}

impl BoardState {
    /// Apply an event to the latched slots.
    ///
    /// Returns `true` if a slot was written, even when the new value equals
    /// the old one. A port that starts past the last pin writes nothing.
    pub fn apply(&mut self, event: &DecodedEvent) -> bool {
        match event {
            DecodedEvent::DigitalPortUpdate { port, mask } => {
                let base = usize::from(*port) * PORT_WIDTH;
                for bit in 0..PORT_WIDTH {
                    // Bits past the last pin are dropped.
                    if let Some(slot) = self.digital.get_mut(base + bit) {
                        *slot = mask & (1 << bit) != 0;
                    }
                }
                base < PIN_COUNT
            }
            DecodedEvent::AnalogChannelUpdate { channel, value } => {
                match self.analog.get_mut(usize::from(*channel)) {
                    Some(slot) => {
                        *slot = *value;
                        true
                    }
                    None => false,
                }
            }
            DecodedEvent::ProtocolVersion { major, minor } => {
                self.protocol_version = format!("Firmata Protocol {major}.{minor}");
                true
            }
            DecodedEvent::FirmwareVersion { major, minor, name } => {
                self.firmware_version = format!("{name} {major}.{minor}");
                true
            }
            DecodedEvent::DeviceEvent { .. } | DecodedEvent::DebugText { .. } => false,
        }
    }
}

/// Shared handle to the board state.
///
/// Cloning the handle shares the same state.
#[derive(Debug, Clone, Default)]
pub struct StateHandle {
    inner: Arc<Mutex<BoardState>>,
}

impl StateHandle {
    /// Create a handle with all slots cleared.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        // State is plain data; a panic elsewhere cannot leave it half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply an event. See [`BoardState::apply`].
    pub fn apply(&self, event: &DecodedEvent) -> bool {
        self.lock().apply(event)
    }

    /// Get the latched level of a digital pin.
    pub fn digital_pin(&self, pin: u8) -> Option<bool> {
        self.lock().digital.get(usize::from(pin)).copied()
    }

    /// Get the latched sample of an analog channel.
    pub fn analog_channel(&self, channel: u8) -> Option<i16> {
        self.lock().analog.get(usize::from(channel)).copied()
    }

    /// Get the protocol version string.
    pub fn protocol_version(&self) -> String {
        self.lock().protocol_version.clone()
    }

    /// Get the firmware version string.
    pub fn firmware_version(&self) -> String {
        self.lock().firmware_version.clone()
    }

    /// Copy the whole state.
    pub fn snapshot(&self) -> BoardState {
        self.lock().clone()
    }

    /// Clear every slot and version string.
    pub fn reset(&self) {
        *self.lock() = BoardState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digital_port_expansion() {
        let mut state = BoardState::default();

        assert!(state.apply(&DecodedEvent::DigitalPortUpdate { port: 1, mask: 0b0000_0101 }));

        assert!(state.digital[8]);
        assert!(!state.digital[9]);
        assert!(state.digital[10]);
        assert!(!state.digital[0]);
    }

    #[test]
    fn test_highest_port_bounded() {
        let mut state = BoardState::default();

        state.apply(&DecodedEvent::DigitalPortUpdate { port: 2, mask: 0xFF });

        assert!(state.digital[16..].iter().all(|&pin| pin));
        assert!(state.digital[..16].iter().all(|&pin| !pin));
    }

    #[test]
    fn test_port_update_clears_bits() {
        let mut state = BoardState::default();
        state.apply(&DecodedEvent::DigitalPortUpdate { port: 0, mask: 0xFF });
        state.apply(&DecodedEvent::DigitalPortUpdate { port: 0, mask: 0x01 });

        assert!(state.digital[0]);
        assert!(state.digital[1..8].iter().all(|&pin| !pin));
    }

    #[test]
    fn test_out_of_range_port_ignored() {
        let mut state = BoardState::default();

        assert!(!state.apply(&DecodedEvent::DigitalPortUpdate { port: 9, mask: 0xFF }));
        assert!(!state.apply(&DecodedEvent::DigitalPortUpdate { port: 3, mask: 0x01 }));

        assert_eq!(state, BoardState::default());
    }

    #[test]
    fn test_partial_last_port_counts_as_write() {
        let mut state = BoardState::default();

        assert!(state.apply(&DecodedEvent::DigitalPortUpdate { port: 2, mask: 0 }));
    }

    #[test]
    fn test_analog_and_versions() {
        let handle = StateHandle::new();

        handle.apply(&DecodedEvent::AnalogChannelUpdate { channel: 11, value: -8192 });
        handle.apply(&DecodedEvent::ProtocolVersion { major: 2, minor: 6 });
        handle.apply(&DecodedEvent::FirmwareVersion {
            major: 1,
            minor: 0,
            name: "micro:bit Firmata".to_string(),
        });

        assert_eq!(handle.analog_channel(11), Some(-8192));
        assert_eq!(handle.analog_channel(16), None);
        assert_eq!(handle.protocol_version(), "Firmata Protocol 2.6");
        assert_eq!(handle.firmware_version(), "micro:bit Firmata 1.0");
    }

    #[test]
    fn test_non_state_events() {
        let handle = StateHandle::new();

        assert!(!handle.apply(&DecodedEvent::DeviceEvent { source_id: 1, event_id: 2 }));
        assert!(!handle.apply(&DecodedEvent::DebugText { text: "hi".to_string() }));
        assert_eq!(handle.snapshot(), BoardState::default());
    }

    #[test]
    fn test_reset_and_shared_clone() {
        let handle = StateHandle::new();
        let other = handle.clone();

        handle.apply(&DecodedEvent::DigitalPortUpdate { port: 0, mask: 1 });
        assert_eq!(other.digital_pin(0), Some(true));
        assert_eq!(other.digital_pin(21), None);

        other.reset();
        assert_eq!(handle.digital_pin(0), Some(false));
    }

    #[test]
    fn test_snapshot_serializes() {
        let handle = StateHandle::new();
        handle.apply(&DecodedEvent::ProtocolVersion { major: 2, minor: 5 });

        let json = serde_json::to_value(handle.snapshot()).unwrap();

        assert_eq!(json["protocol_version"], "Firmata Protocol 2.5");
        assert_eq!(json["digital"].as_array().unwrap().len(), PIN_COUNT);
        assert_eq!(json["analog"].as_array().unwrap().len(), ANALOG_CHANNEL_COUNT);
    }
}
