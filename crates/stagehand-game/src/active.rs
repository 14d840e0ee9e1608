//! The active phase: what runs after the countdown.
//!
//! Gameplay is supplied by the embedding application through
//! [`ActivePhase`]. The server ships [`PlaceholderActive`], which only
//! proves the loop is alive.

use std::time::Duration;

use stagehand_protocol::{ClientId, Frame, Recipient, Role};
use stagehand_session::SessionRegistry;

use crate::{Dispatcher, GameError, Outbox, Phase};

/// Gameplay hooks driven by the tick loop once the session is active.
///
/// All methods run on the tick loop's task, one tick at a time.
pub trait ActivePhase: Send + 'static {
    /// Handler table for client messages during play.
    ///
    /// The default handles nothing, so every message is discarded.
    fn handlers() -> Dispatcher<Self>
    where
        Self: Sized,
    {
        Dispatcher::new(Phase::Active)
    }

    /// Called once, on the tick the session leaves staging.
    fn on_start(&mut self, _registry: &SessionRegistry, _out: &mut Outbox) -> Result<(), GameError> {
        Ok(())
    }

    /// Called after a disconnected client has been removed.
    fn on_leave(&mut self, _id: ClientId, _role: Role, _out: &mut Outbox) -> Result<(), GameError> {
        Ok(())
    }

    /// One fixed step of gameplay.
    fn tick(
        &mut self,
        registry: &SessionRegistry,
        dt: Duration,
        out: &mut Outbox,
    ) -> Result<(), GameError>;
}

/// Stand-in gameplay: every tick, every client gets a raw `HELLO` frame.
#[derive(Debug, Clone)]
pub struct PlaceholderActive {
    hello: Frame,
}

impl PlaceholderActive {
    /// Payload of the frame sent each tick.
    pub const PAYLOAD: &'static [u8] = b"HELLO";

    pub fn new() -> Self {
        Self {
            hello: Frame::new(Self::PAYLOAD.to_vec()).expect("placeholder payload fits in a frame"),
        }
    }
}

impl Default for PlaceholderActive {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivePhase for PlaceholderActive {
    fn on_start(&mut self, registry: &SessionRegistry, _out: &mut Outbox) -> Result<(), GameError> {
        tracing::info!(clients = registry.len(), "placeholder gameplay running");
        Ok(())
    }

    fn tick(
        &mut self,
        _registry: &SessionRegistry,
        _dt: Duration,
        out: &mut Outbox,
    ) -> Result<(), GameError> {
        out.push_frame(Recipient::All, self.hello.clone());
        Ok(())
    }
}
