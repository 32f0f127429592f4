//! Listener registry for device events and state changes.
//!
//! Listeners are stored as `Arc<dyn Fn>` handles in registration order.
//! Notification clones the current list and releases the lock before any
//! listener runs, so a listener may register further listeners (or read
//! state) without deadlocking. Listeners added during a pass are first
//! called on the next event.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use mbfirmata_client::dispatch::ListenerRegistry;
//!
//! let registry = ListenerRegistry::new();
//! let last = Arc::new(AtomicU32::new(0));
//!
//! let seen = last.clone();
//! registry.on_device_event(move |_source, event| seen.store(event, Ordering::SeqCst));
//!
//! registry.notify_device_event(1, 2);
//! assert_eq!(last.load(Ordering::SeqCst), 2);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Listener called with `(source_id, event_id)`.
pub type DeviceEventListener = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Listener called after a state update.
pub type StateChangedListener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Listeners {
    device_event: Vec<DeviceEventListener>,
    state_changed: Vec<StateChangedListener>,
}

/// Ordered, shared listener lists.
///
/// Cloning the registry shares the same lists.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Mutex<Listeners>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Listeners> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a device event listener.
    pub fn on_device_event<F>(&self, listener: F)
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        self.lock().device_event.push(Arc::new(listener));
    }

    /// Register a state changed listener.
    pub fn on_state_changed<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.lock().state_changed.push(Arc::new(listener));
    }

    /// Call every device event listener in registration order.
    pub fn notify_device_event(&self, source_id: u32, event_id: u32) {
        let snapshot = self.lock().device_event.clone();
        for listener in &snapshot {
            listener(source_id, event_id);
        }
    }

    /// Call every state changed listener in registration order.
    pub fn notify_state_changed(&self) {
        let snapshot = self.lock().state_changed.clone();
        for listener in &snapshot {
            listener();
        }
    }

    /// Number of device event listeners.
    pub fn device_event_count(&self) -> usize {
        self.lock().device_event.len()
    }

    /// Number of state changed listeners.
    pub fn state_changed_count(&self) -> usize {
        self.lock().state_changed.len()
    }

    /// Remove every listener.
    pub fn clear(&self) {
        let mut listeners = self.lock();
        listeners.device_event.clear();
        listeners.state_changed.clear();
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("device_event", &self.device_event_count())
            .field("state_changed", &self.state_changed_count())
            .finish()
    }
}
