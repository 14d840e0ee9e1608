//! Outbound frames produced during one step of the tick loop.

use stagehand_protocol::{Frame, Message, Recipient};
use stagehand_session::SessionRegistry;

use crate::GameError;

/// Frames waiting to be queued on client connections, with their recipients.
///
/// Handlers push into an `Outbox` instead of touching connections, which
/// keeps them testable without sockets. The tick loop hands it to
/// [`flush`](Self::flush) after every event so each client sees broadcasts
/// in the order they were produced.
#[derive(Debug, Default)]
pub struct Outbox {
    entries: Vec<(Recipient, Frame)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes and queues a typed message.
    pub fn send(&mut self, to: Recipient, msg: &Message) -> Result<(), GameError> {
        let frame = msg.to_frame()?;
        self.entries.push((to, frame));
        Ok(())
    }

    /// Queues an already-encoded frame.
    pub fn push_frame(&mut self, to: Recipient, frame: Frame) {
        self.entries.push((to, frame));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns everything queued so far.
    pub fn take(&mut self) -> Vec<(Recipient, Frame)> {
        std::mem::take(&mut self.entries)
    }

    /// Queues every pending frame on the matching connections.
    pub fn flush(&mut self, registry: &SessionRegistry) {
        for (to, frame) in self.take() {
            let queued = registry.deliver(to, &frame);
            tracing::trace!(?to, tag = frame.tag(), queued, "frame delivered");
        }
    }
}
