//! The connection pump: two tasks per socket bridging blocking I/O to the
//! non-blocking tick loop.
//!
//! ```text
//!              ┌──────────── receiver task ────────────┐
//!  socket ───▶ │ read_frame → inbound.send             │ ──▶ inbound queue ──▶ tick loop
//!              └───────────────────────────────────────┘
//!              ┌───────────── sender task ─────────────┐
//!  socket ◀─── │ outbound.recv → write_frame           │ ◀── outbound queue ◀── tick loop
//!              └───────────────────────────────────────┘
//! ```
//!
//! Both queues have exactly one producer and one consumer. The only other
//! shared state is the `connected` flag: either task clears it on
//! end-of-stream or I/O failure, and everyone else only reads it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use stagehand_protocol::{ClientId, Frame, read_frame, write_frame};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One client socket plus its receiver and sender tasks.
///
/// The tick loop owns the `Connection` and talks to the tasks only through
/// the queues. Dropping it aborts the receiver and closes the outbound
/// queue; the sender flushes whatever is already queued and exits, after
/// which the socket is released.
pub struct Connection {
    id: ClientId,
    connected: Arc<AtomicBool>,
    inbound: mpsc::UnboundedReceiver<Frame>,
    outbound: mpsc::UnboundedSender<Frame>,
    receiver: JoinHandle<()>,
}

impl Connection {
    /// Splits `stream` and starts the receiver and sender tasks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<S>(id: ClientId, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let connected = Arc::new(AtomicBool::new(true));
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let receiver = tokio::spawn(receive_loop(
            id,
            reader,
            inbound_tx,
            Arc::clone(&connected),
        ));
        tokio::spawn(send_loop(
            id,
            writer,
            outbound_rx,
            Arc::clone(&connected),
        ));

        tracing::debug!(%id, "connection pump started");

        Self {
            id,
            connected,
            inbound,
            outbound,
            receiver,
        }
    }

    /// The client this connection belongs to.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Returns `false` once either task has seen end-of-stream or an error.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Queues a frame for the sender task.
    ///
    /// Returns `false` (and drops the frame) if the peer is already gone.
    pub fn send(&self, frame: Frame) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.outbound.send(frame).is_ok()
    }

    /// Takes the next inbound frame without waiting.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.inbound.try_recv().ok()
    }

    /// Takes every inbound frame that has arrived so far, in arrival order.
    pub fn drain(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = self.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Number of inbound frames waiting to be drained.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // A silent peer would otherwise pin the read half forever.
        self.receiver.abort();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Pump tasks
// ---------------------------------------------------------------------------

async fn receive_loop<R>(
    id: ClientId,
    mut reader: R,
    inbound: mpsc::UnboundedSender<Frame>,
    connected: Arc<AtomicBool>,
) where
    R: AsyncRead + Unpin,
{
    while connected.load(Ordering::Acquire) {
        match read_frame(&mut reader).await {
            Ok(Some(frame)) => {
                tracing::trace!(%id, tag = frame.tag(), len = frame.len(), "frame received");
                if inbound.send(frame).is_err() {
                    break;
                }
            }
            Ok(None) => {
                tracing::info!(%id, "peer closed the stream");
                break;
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "read failed; dropping connection");
                break;
            }
        }
    }
    connected.store(false, Ordering::Release);
}

async fn send_loop<W>(
    id: ClientId,
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<Frame>,
    connected: Arc<AtomicBool>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = outbound.recv().await {
        if !connected.load(Ordering::Acquire) {
            tracing::debug!(%id, tag = frame.tag(), "peer gone; discarding frame");
            return;
        }
        if let Err(e) = write_frame(&mut writer, &frame).await {
            tracing::warn!(%id, error = %e, "write failed; dropping connection");
            connected.store(false, Ordering::Release);
            return;
        }
    }

    // Queue closed by the owner: everything queued has been flushed.
    if let Err(e) = writer.shutdown().await {
        tracing::debug!(%id, error = %e, "shutdown after close failed");
    }
}
