//! Dispatch module - applies decoded events and notifies listeners.
//!
//! Provides:
//! - [`StateHandle`] - shared latched board state
//! - [`ListenerRegistry`] - device event and state changed listeners
//! - [`Dispatcher`] - runs one pass per decoded event
//!
//! # Example
//!
//! ```
//! use mbfirmata_client::codec::DecodedEvent;
//! use mbfirmata_client::dispatch::Dispatcher;
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher.dispatch(&DecodedEvent::AnalogChannelUpdate { channel: 3, value: 512 });
//!
//! assert_eq!(dispatcher.state().analog_channel(3), Some(512));
//! ```

mod listeners;
mod state;

pub use listeners::{DeviceEventListener, ListenerRegistry, StateChangedListener};
pub use state::{BoardState, StateHandle};

use crate::codec::DecodedEvent;

/// Applies events to state and notifies listeners.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    state: StateHandle,
    listeners: ListenerRegistry,
}

impl Dispatcher {
    /// Create a dispatcher with empty state and no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher that notifies an existing registry.
    pub fn with_listeners(listeners: ListenerRegistry) -> Self {
        Self {
            state: StateHandle::new(),
            listeners,
        }
    }

    /// Get the shared state handle.
    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Get the shared listener registry.
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Run one dispatch pass.
    ///
    /// Order: apply to state, device event listeners, then state changed
    /// listeners (once, and only for state updates).
    pub fn dispatch(&self, event: &DecodedEvent) {
        let changed = self.state.apply(event);

        match event {
            DecodedEvent::DeviceEvent {
                source_id,
                event_id,
            } => self.listeners.notify_device_event(*source_id, *event_id),
            DecodedEvent::DebugText { text } => tracing::debug!(%text, "board debug text"),
            _ => {}
        }

        if changed {
            self.listeners.notify_state_changed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_state_applied_before_listeners() {
        let dispatcher = Dispatcher::new();
        let seen = Arc::new(Mutex::new(None));

        let state = dispatcher.state().clone();
        let slot = seen.clone();
        dispatcher.listeners().on_state_changed(move || {
            *slot.lock().unwrap() = state.analog_channel(0);
        });

        dispatcher.dispatch(&DecodedEvent::AnalogChannelUpdate { channel: 0, value: -1 });

        assert_eq!(*seen.lock().unwrap(), Some(-1));
    }

    #[test]
    fn test_device_event_does_not_notify_state() {
        let dispatcher = Dispatcher::new();
        let device = Arc::new(AtomicUsize::new(0));
        let changed = Arc::new(AtomicUsize::new(0));

        let counter = device.clone();
        dispatcher.listeners().on_device_event(move |source, event| {
            assert_eq!((source, event), (1, 2));
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = changed.clone();
        dispatcher.listeners().on_state_changed(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.dispatch(&DecodedEvent::DeviceEvent { source_id: 1, event_id: 2 });
        dispatcher.dispatch(&DecodedEvent::DebugText { text: "x".to_string() });

        assert_eq!(device.load(Ordering::SeqCst), 1);
        assert_eq!(changed.load(Ordering::SeqCst), 0);

        dispatcher.dispatch(&DecodedEvent::DigitalPortUpdate { port: 0, mask: 0 });
        assert_eq!(changed.load(Ordering::SeqCst), 1);
    }
}
