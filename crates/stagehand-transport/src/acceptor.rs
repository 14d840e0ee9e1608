//! The accept task: a bounded loop that hands streams to the tick loop.
//!
//! The task owns the [`Transport`]. Once `max_clients` connections have
//! been accepted it drops the transport, which closes the listening
//! socket for the rest of the process lifetime. Reaching the bound is the
//! normal way this task ends, not an error.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{Accepted, Transport};

/// Pause after a failed accept so a persistent error cannot spin the task.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Handle to a running accept task.
///
/// The tick loop polls [`try_next`](Self::try_next) once per tick; it never
/// waits on the listener. Dropping the handle stops the task.
pub struct Acceptor<S> {
    incoming: mpsc::UnboundedReceiver<Accepted<S>>,
    task: JoinHandle<usize>,
}

impl<S: Send + 'static> Acceptor<S> {
    /// Spawns the accept task for `transport`, bounded by `max_clients`.
    pub fn spawn<T>(mut transport: T, max_clients: usize) -> Self
    where
        T: Transport<Stream = S>,
    {
        let (tx, incoming) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut accepted = 0;
            while accepted < max_clients {
                match transport.accept().await {
                    Ok(conn) => {
                        let peer = conn.peer;
                        if tx.send(conn).is_err() {
                            tracing::debug!("tick loop gone; accept task exiting");
                            return accepted;
                        }
                        accepted += 1;
                        tracing::info!(%peer, accepted, max_clients, "client accepted");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed; retrying");
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    }
                }
            }

            drop(transport);
            tracing::info!(max_clients, "done accepting clients; listener closed");
            accepted
        });

        Self { incoming, task }
    }

    /// Returns the next accepted stream, if one is waiting.
    pub fn try_next(&mut self) -> Option<Accepted<S>> {
        self.incoming.try_recv().ok()
    }

    /// Returns `true` once the accept task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<S> Drop for Acceptor<S> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
