//! Error types for mbfirmata-client.
//!
//! Protocol anomalies (incomplete, malformed or unknown messages) are never
//! errors: they are skipped or buffered by the decoder. The variants below
//! cover the layers around it.

use thiserror::Error;

use crate::session::ConnectionState;

/// Main error type for all client operations.
#[derive(Debug, Error)]
pub enum FirmataError {
    /// I/O error on the serial transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while loading configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// One incomplete message filled the receive buffer cap.
    #[error("Receive buffer overflow: {buffered} buffered, {incoming} bytes not accepted, limit {limit}")]
    BufferOverflow {
        buffered: usize,
        incoming: usize,
        limit: usize,
    },

    /// Session state machine rejected a transition.
    #[error("Invalid session transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// Connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Backpressure timeout - write queue full.
    #[error("Backpressure timeout")]
    BackpressureTimeout,
}

/// Result type alias using FirmataError.
pub type Result<T> = std::result::Result<T, FirmataError>;
