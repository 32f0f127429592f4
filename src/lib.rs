//! # mbfirmata-client
//!
//! Host-side client for a micro:bit running Firmata with display, sensor
//! and event extensions.
//!
//! ## Architecture
//!
//! - **Receive path** (synchronous): bytes are appended to a receive
//!   buffer, split into messages by the framer, decoded into events and
//!   dispatched to latched state and listeners
//! - **Send path**: typed requests are encoded into frames and queued on a
//!   dedicated writer task
//!
//! The [`Session`](session::Session) can be driven directly by any byte
//! source. The async [`Client`] wraps it around a tokio transport.
//!
//! ## Example
//!
//! ```
//! use mbfirmata_client::session::Session;
//!
//! let mut session = Session::new();
//! session.deliver(&[0xF9, 0x02, 0x05]).unwrap();
//!
//! assert_eq!(session.state().protocol_version(), "Firmata Protocol 2.5");
//! ```

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod session;
pub mod writer;

mod client;

pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use error::FirmataError;
pub use session::{ConnectionState, Session};
