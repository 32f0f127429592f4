//! Client builder and runtime loop.
//!
//! The [`ClientBuilder`] collects configuration and listeners. The
//! [`Client`] manages the lifecycle:
//! 1. Split the transport into read and write halves
//! 2. Spawn the writer task
//! 3. Send the protocol and firmware version queries
//! 4. Read bytes and feed them to the session until EOF, error or
//!    [`Client::disconnect`]
//!
//! Opening the serial port is left to the caller; any
//! `AsyncRead + AsyncWrite` stream works.
//!
//! # Example
//!
//! ```
//! use mbfirmata_client::Client;
//! use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Stands in for an opened serial port
//!     let (port, mut board) = duplex(1024);
//!
//!     let client = Client::builder()
//!         .on_device_event(|source, event| println!("event {source}/{event}"))
//!         .connect(port)
//!         .await?;
//!
//!     let mut queries = [0u8; 6];
//!     board.read_exact(&mut queries).await?;
//!     board.write_all(&[0xF9, 2, 6]).await?;
//!     drop(board);
//!
//!     let state = client.state().clone();
//!     client.wait_for_disconnect().await?;
//!
//!     assert_eq!(state.protocol_version(), "Firmata Protocol 2.6");
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::codec::{CommandEncoder, PinMode, DISPLAY_SIZE};
use crate::config::ClientConfig;
use crate::dispatch::{ListenerRegistry, StateHandle};
use crate::error::{FirmataError, Result};
use crate::session::{send_command, ConnectionState, Session};
use crate::writer::{spawn_writer, WriterHandle};

/// Builder for configuring and connecting a client.
pub struct ClientBuilder {
    config: ClientConfig,
    listeners: ListenerRegistry,
}

impl ClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the cap on unconsumed receive bytes.
    ///
    /// Default: 64 KiB
    pub fn max_buffered(mut self, limit: usize) -> Self {
        self.config.max_buffered = limit;
        self
    }

    /// Set the bytes requested per transport read.
    ///
    /// Default: 1024
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size;
        self
    }

    /// Set the default scroll delay (0-127 ms).
    ///
    /// Default: 120
    pub fn scroll_delay(mut self, delay: u8) -> Self {
        self.config.scroll_delay = delay;
        self
    }

    /// Set how many outbound frames queue before `send` waits.
    ///
    /// Default: 64
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set how long `send` waits for a free queue slot.
    ///
    /// Default: 2 seconds
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.set_send_timeout(timeout);
        self
    }

    /// Register a device event listener before connecting.
    pub fn on_device_event<F>(self, listener: F) -> Self
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        self.listeners.on_device_event(listener);
        self
    }

    /// Register a state changed listener before connecting.
    pub fn on_state_changed<F>(self, listener: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.on_state_changed(listener);
        self
    }

    /// Connect over an already opened transport.
    pub async fn connect<T>(self, transport: T) -> Result<Client>
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        Client::connect(transport, self.config, self.listeners).await
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A connected board.
///
/// Command methods that take a pin, channel or coordinate return
/// `Ok(false)` when the value is out of range; nothing is sent then.
pub struct Client {
    writer: WriterHandle,
    state: StateHandle,
    listeners: ListenerRegistry,
    scroll_delay: u8,
    status_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    read_task: JoinHandle<Result<()>>,
    _writer_task: JoinHandle<Result<()>>,
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    async fn connect<T>(
        transport: T,
        config: ClientConfig,
        listeners: ListenerRegistry,
    ) -> Result<Self>
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let mut session = Session::with_listeners(config.max_buffered, listeners);
        session.begin_connect()?;

        let (reader, write_half) = tokio::io::split(transport);
        let (writer, writer_task) = spawn_writer(write_half, config.writer_config());

        writer.send(CommandEncoder::query_protocol_version()).await?;
        writer.send(CommandEncoder::query_firmware_version()).await?;

        session.mark_connected()?;
        tracing::info!("connected to board");

        let state = session.state().clone();
        let listeners = session.listeners().clone();

        let (status_tx, status_rx) = watch::channel(session.connection_state());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let read_task = tokio::spawn(Self::read_loop(
            reader,
            session,
            config.read_chunk_size,
            shutdown_rx,
            status_tx,
        ));

        Ok(Client {
            writer,
            state,
            listeners,
            scroll_delay: config.scroll_delay,
            status_rx,
            shutdown_tx: Some(shutdown_tx),
            read_task,
            _writer_task: writer_task,
        })
    }

    /// Main read loop - feeds transport bytes to the session.
    ///
    /// Ends on EOF, a read error, a receive buffer overflow or a shutdown
    /// signal. The session is disconnected in every case.
    async fn read_loop<R: AsyncRead + Unpin>(
        mut reader: R,
        mut session: Session,
        chunk_size: usize,
        mut shutdown_rx: oneshot::Receiver<()>,
        status_tx: watch::Sender<ConnectionState>,
    ) -> Result<()> {
        let mut buf = vec![0u8; chunk_size.max(1)];

        let result = loop {
            tokio::select! {
                _ = &mut shutdown_rx => break Ok(()),
                read = reader.read(&mut buf) => match read {
                    Ok(0) => {
                        tracing::debug!("transport closed");
                        break Ok(());
                    }
                    Ok(n) => {
                        if let Err(e) = session.deliver(&buf[..n]) {
                            break Err(e);
                        }
                    }
                    Err(e) => break Err(FirmataError::Io(e)),
                },
            }
        };

        if let Err(e) = &result {
            tracing::error!(error = %e, "read loop ended");
        }

        session.disconnect();
        let _ = status_tx.send(ConnectionState::Disconnected);
        result
    }

    /// Send one command frame, or nothing if the encoder declined it.
    async fn command(&self, frame: Option<Bytes>) -> Result<bool> {
        send_command(&self.writer, frame).await
    }

    // Raw output

    /// Send a pre-encoded frame.
    pub async fn send(&self, frame: Bytes) -> Result<()> {
        self.writer.send(frame).await
    }

    /// Get a handle for sending frames from other tasks or listeners.
    ///
    /// Listeners run synchronously and should use
    /// [`WriterHandle::try_send`].
    pub fn writer(&self) -> WriterHandle {
        self.writer.clone()
    }

    // Version queries

    /// Ask the board for its Firmata protocol version.
    pub async fn query_protocol_version(&self) -> Result<()> {
        self.send(CommandEncoder::query_protocol_version()).await
    }

    /// Ask the board for its firmware name and version.
    pub async fn query_firmware_version(&self) -> Result<()> {
        self.send(CommandEncoder::query_firmware_version()).await
    }

    // Display

    /// Clear the display and stop any animation.
    pub async fn display_clear(&self) -> Result<()> {
        self.send(CommandEncoder::display_clear()).await
    }

    /// Show a full 5x5 image.
    pub async fn display_show(
        &self,
        grayscale: bool,
        pixels: &[[u8; DISPLAY_SIZE]; DISPLAY_SIZE],
    ) -> Result<()> {
        self.send(CommandEncoder::display_show(grayscale, pixels))
            .await
    }

    /// Set one pixel's brightness.
    pub async fn display_plot(&self, x: u8, y: u8, brightness: u8) -> Result<bool> {
        self.command(CommandEncoder::display_plot(x, y, brightness))
            .await
    }

    /// Scroll a string with the configured delay.
    pub async fn scroll_string(&self, text: &str) -> Result<bool> {
        self.scroll_string_with_delay(text, self.scroll_delay).await
    }

    /// Scroll a string with an explicit delay (0-127 ms).
    pub async fn scroll_string_with_delay(&self, text: &str, delay: u8) -> Result<bool> {
        self.command(CommandEncoder::scroll_string(text, delay))
            .await
    }

    /// Scroll an integer with the configured delay.
    pub async fn scroll_integer(&self, n: i32) -> Result<bool> {
        self.scroll_integer_with_delay(n, self.scroll_delay).await
    }

    /// Scroll an integer with an explicit delay (0-127 ms).
    pub async fn scroll_integer_with_delay(&self, n: i32, delay: u8) -> Result<bool> {
        self.command(CommandEncoder::scroll_integer(n, delay))
            .await
    }

    /// Enable or disable the display.
    pub async fn enable_display(&self, on: bool) -> Result<()> {
        self.send(CommandEncoder::enable_display(on)).await
    }

    // Subscriptions

    /// Start or stop tracking the digital port containing `pin`.
    pub async fn track_digital_pin(&self, pin: u8, on: bool) -> Result<bool> {
        self.command(CommandEncoder::track_digital_pin(pin, on))
            .await
    }

    /// Start or stop streaming an analog channel.
    pub async fn stream_analog_channel(&self, channel: u8, on: bool) -> Result<bool> {
        self.command(CommandEncoder::stream_analog_channel(channel, on))
            .await
    }

    /// Set the milliseconds between streamed analog samples.
    pub async fn set_sampling_interval(&self, millis: u16) -> Result<bool> {
        self.command(CommandEncoder::set_sampling_interval(millis))
            .await
    }

    /// Turn touch mode on or off for pin 0-2.
    pub async fn set_touch_mode(&self, pin: u8, on: bool) -> Result<bool> {
        self.command(CommandEncoder::set_touch_mode(pin, on))
            .await
    }

    // Pins

    /// Set the mode of a pin.
    pub async fn set_pin_mode(&self, pin: u8, mode: PinMode) -> Result<bool> {
        self.command(CommandEncoder::set_pin_mode(pin, mode))
            .await
    }

    /// Drive a digital output pin.
    pub async fn set_digital_output(&self, pin: u8, on: bool) -> Result<bool> {
        self.command(CommandEncoder::set_digital_output(pin, on))
            .await
    }

    /// Write a PWM value to a pin.
    pub async fn set_analog_output(&self, pin: u8, value: u16) -> Result<bool> {
        self.command(CommandEncoder::set_analog_output(pin, value))
            .await
    }

    /// Turn on the light sensor.
    pub async fn enable_light_sensor(&self) -> Result<()> {
        self.send(CommandEncoder::enable_light_sensor()).await
    }

    /// Reset pin modes and streaming on the board.
    pub async fn system_reset(&self) -> Result<()> {
        self.send(CommandEncoder::system_reset()).await
    }

    // State

    /// Get the shared state handle.
    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Get the latched level of a digital pin.
    pub fn digital_pin(&self, pin: u8) -> Option<bool> {
        self.state.digital_pin(pin)
    }

    /// Get the latched sample of an analog channel.
    pub fn analog_channel(&self, channel: u8) -> Option<i16> {
        self.state.analog_channel(channel)
    }

    /// Get the protocol version string (empty until reported).
    pub fn protocol_version(&self) -> String {
        self.state.protocol_version()
    }

    /// Get the firmware version string (empty until reported).
    pub fn firmware_version(&self) -> String {
        self.state.firmware_version()
    }

    // Listeners

    /// Register a device event listener.
    pub fn on_device_event<F>(&self, listener: F)
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        self.listeners.on_device_event(listener);
    }

    /// Register a state changed listener.
    pub fn on_state_changed<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.on_state_changed(listener);
    }

    // Lifecycle

    /// Get the connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.status_rx.borrow()
    }

    /// Check if the outbound queue is full.
    pub fn is_queue_full(&self) -> bool {
        self.writer.is_full()
    }

    /// Outbound frames not yet handed to the transport.
    pub fn queued_frames(&self) -> usize {
        self.writer.queued()
    }

    /// Stop reading and disconnect the session.
    pub async fn disconnect(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.wait_for_disconnect().await
    }

    /// Wait until the board disconnects.
    ///
    /// Returns the error that ended the read loop, if any.
    pub async fn wait_for_disconnect(self) -> Result<()> {
        match self.read_task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "read task failed");
                Err(FirmataError::ConnectionClosed)
            }
        }
    }
}
