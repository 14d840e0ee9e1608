//! Per-phase tag → handler tables.
//!
//! Each phase registers the message types it understands. Anything else,
//! including tags no build of the server knows about, goes to the default
//! branch: logged and discarded, with no state change and no reply. That
//! lets clients speak a newer protocol than the server without being cut
//! off.

use std::collections::HashMap;

use stagehand_protocol::{ClientId, Frame, MessageType};
use stagehand_session::SessionRegistry;

use crate::{GameError, Outbox, Phase};

/// What a handler gets to work with besides its own phase state.
pub struct Context<'a> {
    /// The roster, for role lookups and updates.
    pub registry: &'a mut SessionRegistry,
    /// Where replies and broadcasts go.
    pub outbox: &'a mut Outbox,
}

/// A message handler for phase state `S`.
///
/// Receives the sender's id and the frame body (the bytes after the tag).
pub type Handler<S> = fn(&mut S, &mut Context<'_>, ClientId, &[u8]) -> Result<(), GameError>;

/// What happened to one dispatched frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// A handler ran to completion.
    Handled(MessageType),
    /// No handler for this tag in this phase; discarded.
    Ignored(u8),
    /// The handler rejected the body; discarded.
    Malformed(MessageType),
}

/// Handler table for one phase.
pub struct Dispatcher<S> {
    phase: Phase,
    handlers: HashMap<MessageType, Handler<S>>,
}

impl<S> Dispatcher<S> {
    /// An empty table; every message falls through to the default branch.
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for `kind`, replacing any earlier one.
    pub fn on(mut self, kind: MessageType, handler: Handler<S>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// Returns `true` if `kind` has a handler in this table.
    pub fn handles(&self, kind: MessageType) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Routes one frame to its handler.
    pub fn dispatch(
        &self,
        state: &mut S,
        cx: &mut Context<'_>,
        sender: ClientId,
        frame: &Frame,
    ) -> Dispatched {
        let handler = MessageType::try_from(frame.tag())
            .ok()
            .and_then(|kind| self.handlers.get(&kind).map(|h| (kind, *h)));

        let Some((kind, handler)) = handler else {
            tracing::debug!(
                phase = %self.phase,
                %sender,
                tag = frame.tag(),
                "unknown message type; discarding"
            );
            return Dispatched::Ignored(frame.tag());
        };

        match handler(state, cx, sender, frame.body()) {
            Ok(()) => Dispatched::Handled(kind),
            Err(e) => {
                tracing::warn!(
                    phase = %self.phase,
                    %sender,
                    %kind,
                    error = %e,
                    "malformed message; discarding"
                );
                Dispatched::Malformed(kind)
            }
        }
    }
}
