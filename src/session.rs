//! Session - receive buffer, decoder and dispatcher behind one entry point.
//!
//! A [`Session`] owns the receive buffer exclusively; [`Session::deliver`]
//! is the only path that mutates it. State and listeners are shared
//! handles so other tasks can read and register while the session is
//! owned by a read loop.
//!
//! # Example
//!
//! ```
//! use mbfirmata_client::session::Session;
//!
//! let mut session = Session::new();
//! session.begin_connect().unwrap();
//! session.mark_connected().unwrap();
//!
//! session.deliver(&[0xF0, 0x0D]).unwrap();
//! let events = session.deliver(&[1, 0, 0, 2, 0, 0, 0xF7]).unwrap();
//!
//! assert_eq!(events.len(), 1);
//! ```

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use serde::Serialize;

use crate::codec::{CommandDecoder, DecodedEvent};
use crate::dispatch::{Dispatcher, ListenerRegistry, StateHandle};
use crate::error::{FirmataError, Result};
use crate::protocol::{ReceiveBuffer, DEFAULT_MAX_BUFFERED};

/// Boxed future returned by [`FrameSink::send`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Destination for encoded outbound frames.
pub trait FrameSink: Send + Sync {
    /// Send one complete frame.
    fn send(&self, frame: Bytes) -> BoxFuture<'_, Result<()>>;
}

/// Send an encoder result through a sink.
///
/// Returns `Ok(false)` without sending when the encoder declined the
/// request (`None`).
pub async fn send_command<S>(sink: &S, frame: Option<Bytes>) -> Result<bool>
where
    S: FrameSink + ?Sized,
{
    match frame {
        Some(frame) => {
            sink.send(frame).await?;
            Ok(true)
        }
        None => {
            tracing::debug!("command out of range, nothing sent");
            Ok(false)
        }
    }
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Decoding session for one board.
#[derive(Debug)]
pub struct Session {
    buffer: ReceiveBuffer,
    dispatcher: Dispatcher,
    connection: ConnectionState,
}

impl Session {
    /// Create a disconnected session with the default buffer cap.
    pub fn new() -> Self {
        Self::with_max_buffered(DEFAULT_MAX_BUFFERED)
    }

    /// Create a disconnected session with a custom buffer cap.
    pub fn with_max_buffered(max_buffered: usize) -> Self {
        Self::with_listeners(max_buffered, ListenerRegistry::new())
    }

    /// Create a disconnected session whose listeners are already registered.
    pub fn with_listeners(max_buffered: usize, listeners: ListenerRegistry) -> Self {
        Self {
            buffer: ReceiveBuffer::with_max_buffered(max_buffered),
            dispatcher: Dispatcher::with_listeners(listeners),
            connection: ConnectionState::Disconnected,
        }
    }

    /// Deliver bytes read from the transport.
    ///
    /// Every complete message is decoded and dispatched before this
    /// returns. The decoded events are returned in wire order.
    ///
    /// # Errors
    ///
    /// Returns [`FirmataError::BufferOverflow`] if one incomplete message
    /// outgrows the receive buffer cap. Messages that completed earlier in
    /// the same delivery are still dispatched.
    pub fn deliver(&mut self, data: &[u8]) -> Result<Vec<DecodedEvent>> {
        let mut messages = Vec::new();
        let pushed = self.buffer.push_into(data, &mut messages);

        let mut events = Vec::with_capacity(messages.len());
        for message in &messages {
            if let Some(event) = CommandDecoder::decode(message) {
                self.dispatcher.dispatch(&event);
                events.push(event);
            }
        }
        pushed.map(|()| events)
    }

    /// Get the shared state handle.
    pub fn state(&self) -> &StateHandle {
        self.dispatcher.state()
    }

    /// Get the shared listener registry.
    pub fn listeners(&self) -> &ListenerRegistry {
        self.dispatcher.listeners()
    }

    /// Register a device event listener.
    pub fn on_device_event<F>(&self, listener: F)
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        self.listeners().on_device_event(listener);
    }

    /// Register a state changed listener.
    pub fn on_state_changed<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners().on_state_changed(listener);
    }

    /// Get the connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    /// Bytes waiting for the rest of a message.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// `Disconnected -> Connecting`.
    pub fn begin_connect(&mut self) -> Result<()> {
        self.transition(ConnectionState::Disconnected, ConnectionState::Connecting)
    }

    /// `Connecting -> Connected`.
    pub fn mark_connected(&mut self) -> Result<()> {
        self.transition(ConnectionState::Connecting, ConnectionState::Connected)
    }

    /// Enter `Disconnected` from any state.
    ///
    /// Clears the receive buffer and all listeners. Latched board state is
    /// kept so the last known values stay readable.
    pub fn disconnect(&mut self) {
        if self.connection != ConnectionState::Disconnected {
            tracing::debug!(from = ?self.connection, "session disconnected");
        }
        self.connection = ConnectionState::Disconnected;
        self.buffer.clear();
        self.listeners().clear();
    }

    fn transition(&mut self, from: ConnectionState, to: ConnectionState) -> Result<()> {
        if self.connection != from {
            return Err(FirmataError::InvalidTransition {
                from: self.connection,
                to,
            });
        }
        tracing::debug!(?from, ?to, "session transition");
        self.connection = to;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
