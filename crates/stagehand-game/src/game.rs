//! One session: registry, phase, and the pass run every tick.

use std::time::Duration;

use stagehand_protocol::{ClientId, Message, Recipient};
use stagehand_session::SessionRegistry;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    ActivePhase, Context, Dispatched, Dispatcher, GameError, Outbox, Phase, PlaceholderActive,
    Staging, StagingConfig,
};

/// What one [`Game::step`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Frames a handler accepted.
    pub handled: usize,
    /// Frames discarded as unknown or malformed.
    pub discarded: usize,
    /// Clients removed because their connection dropped.
    pub departed: Vec<ClientId>,
    /// The session left staging during this step.
    pub started: bool,
}

/// The whole session as the tick loop sees it.
///
/// Owned by a single task. Nothing inside is shared with the connection
/// pumps except through their queues.
pub struct Game<A: ActivePhase = PlaceholderActive> {
    phase: Phase,
    registry: SessionRegistry,
    outbox: Outbox,
    staging: Staging,
    staging_handlers: Dispatcher<Staging>,
    active: A,
    active_handlers: Dispatcher<A>,
}

impl<A: ActivePhase> Game<A> {
    pub fn new(config: StagingConfig, active: A) -> Self {
        Self {
            phase: Phase::Staging,
            registry: SessionRegistry::new(),
            outbox: Outbox::new(),
            staging: Staging::new(config),
            staging_handlers: Staging::handlers(),
            active,
            active_handlers: A::handlers(),
        }
    }

    /// Registers a freshly accepted stream.
    ///
    /// Returns `Ok(None)` without registering if the session is already
    /// active or holds [`Staging::MAX_CLIENTS`] clients; the stream is
    /// dropped, which closes it.
    pub fn admit<S>(&mut self, stream: S) -> Result<Option<ClientId>, GameError>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        if self.phase.is_active() {
            tracing::warn!("connection refused: session already active");
            return Ok(None);
        }
        if self.registry.len() >= Staging::MAX_CLIENTS {
            tracing::warn!(clients = self.registry.len(), "connection refused: session full");
            return Ok(None);
        }

        let id = self.registry.accept(stream)?;
        let joined = self.staging.on_join(&self.registry, id, &mut self.outbox);
        self.outbox.flush(&self.registry);
        joined?;
        Ok(Some(id))
    }

    /// Runs one tick.
    ///
    /// 1. Every frame that has arrived, connection by connection in join
    ///    order, goes to the current phase's handler table.
    /// 2. Clients whose connection dropped are removed and announced.
    /// 3. The phase advances: the staging countdown, or one gameplay step.
    ///
    /// Outbound frames are handed to the connections after every event.
    pub fn step(&mut self, dt: Duration) -> StepReport {
        let mut report = StepReport::default();

        for (sender, frame) in self.registry.drain_inbound() {
            let mut cx = Context {
                registry: &mut self.registry,
                outbox: &mut self.outbox,
            };
            let outcome = match self.phase {
                Phase::Staging => {
                    self.staging_handlers
                        .dispatch(&mut self.staging, &mut cx, sender, &frame)
                }
                Phase::Active => {
                    self.active_handlers
                        .dispatch(&mut self.active, &mut cx, sender, &frame)
                }
            };
            match outcome {
                Dispatched::Handled(_) => report.handled += 1,
                Dispatched::Ignored(_) | Dispatched::Malformed(_) => report.discarded += 1,
            }
            self.outbox.flush(&self.registry);
        }

        for client in self.registry.remove_disconnected() {
            let (id, role) = (client.id(), client.role());
            drop(client);

            let left = match self.phase {
                Phase::Staging => self.staging.on_leave(id, role, &mut self.outbox),
                Phase::Active => self
                    .outbox
                    .send(Recipient::All, &Message::PlayerDisconnect { id })
                    .and_then(|()| self.active.on_leave(id, role, &mut self.outbox)),
            };
            if let Err(e) = left {
                tracing::warn!(%id, error = %e, "leave handling failed");
            }
            self.outbox.flush(&self.registry);
            report.departed.push(id);
        }

        let advanced = match self.phase {
            Phase::Staging => self.advance_staging(dt, &mut report),
            Phase::Active => self.active.tick(&self.registry, dt, &mut self.outbox),
        };
        if let Err(e) = advanced {
            tracing::warn!(phase = %self.phase, error = %e, "phase step failed");
        }
        self.outbox.flush(&self.registry);

        report
    }

    fn advance_staging(&mut self, dt: Duration, report: &mut StepReport) -> Result<(), GameError> {
        if !self.staging.advance(dt, &mut self.outbox)? {
            return Ok(());
        }
        self.outbox.flush(&self.registry);

        if let Some(next) = self.phase.next() {
            tracing::info!(from = %self.phase, to = %next, clients = self.registry.len(), "phase transition");
            self.phase = next;
        }
        report.started = true;
        self.active.on_start(&self.registry, &mut self.outbox)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn staging(&self) -> &Staging {
        &self.staging
    }

    pub fn active(&self) -> &A {
        &self.active
    }
}

impl Default for Game<PlaceholderActive> {
    fn default() -> Self {
        Self::new(StagingConfig::default(), PlaceholderActive::new())
    }
}
