//! Outbound frame queue for the serial link.
//!
//! One task owns the write half of the transport. Everything else holds a
//! [`WriterHandle`] and queues encoded frames on a bounded channel, so
//! frames from different callers never interleave on the wire.
//!
//! ```text
//! Client ──────┐
//! Listener ────┼─► bounded mpsc<Bytes> ─► writer task ─► serial port
//! Other task ──┘
//! ```
//!
//! The channel bound is the only flow control: a full queue means the
//! serial link is behind, and `send` waits for a free slot up to the
//! configured timeout. Frames already queued when the task wakes are
//! coalesced into a single write, which keeps display animations from
//! paying one syscall per pixel.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::error::{FirmataError, Result};
use crate::session::{BoxFuture, FrameSink};

/// Default number of frames the queue holds.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default time `send` waits for a free queue slot.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound on bytes gathered into one write.
const MAX_COALESCE_BYTES: usize = 512;

/// Writer task settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Frames the queue holds before `send` has to wait.
    pub queue_capacity: usize,
    /// How long `send` waits for a free slot.
    pub send_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

/// Sending side of the outbound queue.
///
/// Clones share the same queue and writer task.
#[derive(Debug, Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<Bytes>,
    send_timeout: Duration,
}

impl WriterHandle {
    /// Queue a frame, waiting for a free slot up to the send timeout.
    ///
    /// # Errors
    ///
    /// [`FirmataError::BackpressureTimeout`] if the queue stayed full,
    /// [`FirmataError::ConnectionClosed`] if the writer task has stopped.
    pub async fn send(&self, frame: Bytes) -> Result<()> {
        match tokio::time::timeout(self.send_timeout, self.tx.send(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(FirmataError::ConnectionClosed),
            Err(_) => {
                tracing::warn!(
                    queued = self.queued(),
                    timeout = ?self.send_timeout,
                    "outbound queue stayed full"
                );
                Err(FirmataError::BackpressureTimeout)
            }
        }
    }

    /// Queue a frame without waiting.
    ///
    /// Safe to call from a listener, which runs synchronously inside the
    /// read loop.
    pub fn try_send(&self, frame: Bytes) -> Result<()> {
        self.tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => FirmataError::BackpressureTimeout,
            TrySendError::Closed(_) => FirmataError::ConnectionClosed,
        })
    }

    /// Frames waiting in the queue.
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Check if `send` would have to wait.
    pub fn is_full(&self) -> bool {
        self.tx.capacity() == 0
    }

    /// Check if the writer task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl FrameSink for WriterHandle {
    fn send(&self, frame: Bytes) -> BoxFuture<'_, Result<()>> {
        Box::pin(WriterHandle::send(self, frame))
    }
}

/// Spawn the writer task over `port`.
///
/// The task ends with `Ok` once every handle is dropped, or with the
/// first write error.
pub fn spawn_writer<W>(port: W, config: WriterConfig) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let handle = WriterHandle {
        tx,
        send_timeout: config.send_timeout,
    };

    (handle, tokio::spawn(write_frames(rx, port)))
}

async fn write_frames<W>(mut rx: mpsc::Receiver<Bytes>, mut port: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut out = BytesMut::with_capacity(MAX_COALESCE_BYTES);

    while let Some(frame) = rx.recv().await {
        out.extend_from_slice(&frame);
        while out.len() < MAX_COALESCE_BYTES {
            match rx.try_recv() {
                Ok(next) => out.extend_from_slice(&next),
                Err(_) => break,
            }
        }

        let len = out.len();
        let written = async {
            port.write_all(&out).await?;
            port.flush().await
        }
        .await;
        out.clear();

        if let Err(e) = written {
            tracing::error!(error = %e, len, "serial write failed");
            return Err(e.into());
        }
        tracing::trace!(len, "frames written");
    }

    Ok(())
}
