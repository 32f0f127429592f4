//! Client configuration.
//!
//! All fields have defaults, so a partial JSON document is enough:
//!
//! ```
//! use mbfirmata_client::config::ClientConfig;
//!
//! let config = ClientConfig::from_json(r#"{ "scroll_delay": 80 }"#).unwrap();
//! assert_eq!(config.scroll_delay, 80);
//! assert_eq!(config.max_buffered, 64 * 1024);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::DEFAULT_SCROLL_DELAY;
use crate::error::Result;
use crate::protocol::DEFAULT_MAX_BUFFERED;
use crate::writer::{WriterConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_SEND_TIMEOUT};

/// Default bytes requested per transport read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Settings for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Cap on unconsumed receive bytes.
    pub max_buffered: usize,
    /// Bytes requested per transport read.
    pub read_chunk_size: usize,
    /// Scroll delay used when the caller gives none (0-127 ms).
    pub scroll_delay: u8,
    /// Outbound frames queued before `send` has to wait.
    pub queue_capacity: usize,
    /// How long `send` waits for a free queue slot.
    pub send_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_buffered: DEFAULT_MAX_BUFFERED,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            scroll_delay: DEFAULT_SCROLL_DELAY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            send_timeout_ms: millis(DEFAULT_SEND_TIMEOUT),
        }
    }
}

impl ClientConfig {
    /// Parse a configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Send timeout as a `Duration`.
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Set the send timeout, saturating at `u64::MAX` milliseconds.
    pub fn set_send_timeout(&mut self, timeout: Duration) {
        self.send_timeout_ms = millis(timeout);
    }

    /// Derive the writer task settings.
    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            queue_capacity: self.queue_capacity,
            send_timeout: self.send_timeout(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
