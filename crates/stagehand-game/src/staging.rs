//! The staging state machine.
//!
//! While the session is in [`Phase::Staging`](crate::Phase::Staging),
//! clients pick roles and vote to start. The rules:
//!
//! - **Vote**: starts the countdown, but only with enough clients, every
//!   one of them ready, and no countdown already running.
//! - **Veto**: cancels a running countdown.
//! - **Role change**: refused while the countdown runs. The exclusive
//!   role can only be taken while nobody else holds it; otherwise the
//!   requester alone gets a rejection naming the holder.
//! - **Countdown**: once it passes the threshold, everyone gets
//!   `StartGame` and the session goes active.
//!
//! All mutation happens on the tick loop's task, so there is no locking.

use std::time::Duration;

use stagehand_protocol::{ClientId, Message, MessageType, Recipient, Role, parse_role_request};
use stagehand_session::SessionRegistry;

use crate::{Context, Dispatcher, GameError, Outbox, Phase};

// ---------------------------------------------------------------------------
// Config and state
// ---------------------------------------------------------------------------

/// Tunables for the staging phase.
#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// Fewest registered clients a vote can start the game with.
    pub min_players: usize,
    /// How long the countdown runs before the game starts.
    pub countdown: Duration,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            countdown: Duration::from_secs(5),
        }
    }
}

/// Shared staging state.
///
/// Invariants, checked at every tick boundary:
/// - `unready` equals the number of clients whose role is
///   [`Role::Unassigned`].
/// - `robber` is `Some(id)` exactly when client `id` holds the exclusive
///   role, and no other client holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingState {
    /// A start vote passed and the countdown is running.
    pub starting: bool,
    /// Time accumulated since the vote.
    pub countdown: Duration,
    /// Holder of the exclusive role, by id. Resolved through the registry.
    pub robber: Option<ClientId>,
    /// Clients that have not picked a role yet.
    pub unready: usize,
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Staging config plus state, with the rules as methods.
#[derive(Debug, Clone, Default)]
pub struct Staging {
    config: StagingConfig,
    state: StagingState,
}

impl Staging {
    pub fn new(config: StagingConfig) -> Self {
        Self {
            config,
            state: StagingState::default(),
        }
    }

    /// The staging handler table: votes, vetoes, and role requests.
    pub fn handlers() -> Dispatcher<Staging> {
        Dispatcher::new(Phase::Staging)
            .on(MessageType::VoteToStart, handle_vote)
            .on(MessageType::VetoStart, handle_veto)
            .on(MessageType::RoleChange, handle_role_change)
    }

    pub fn state(&self) -> &StagingState {
        &self.state
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Most clients a staging session can hold: every newcomer's
    /// `PlayerSync` must list all the others in one frame.
    pub const MAX_CLIENTS: usize = Message::MAX_SYNC_ROSTER + 1;

    /// A client was just registered.
    ///
    /// Everyone else hears `PlayerConnect(id)`; the newcomer gets a
    /// `PlayerSync` listing everyone already present. The readiness count
    /// covers the newcomer even if the sync cannot be encoded, in which
    /// case nothing is queued.
    pub fn on_join(
        &mut self,
        registry: &SessionRegistry,
        id: ClientId,
        out: &mut Outbox,
    ) -> Result<(), GameError> {
        self.state.unready += 1;

        let roster = registry
            .roster()
            .into_iter()
            .filter(|(other, _)| *other != id)
            .collect();
        let sync = Message::PlayerSync { new_id: id, roster }.to_frame()?;

        out.send(Recipient::AllExcept(id), &Message::PlayerConnect { id })?;
        out.push_frame(Recipient::Client(id), sync);

        tracing::info!(%id, unready = self.state.unready, "client joined staging");
        Ok(())
    }

    /// A client has been removed from the registry.
    ///
    /// Repairs the readiness count and the exclusive-role holder, tells the
    /// others, and cancels a running countdown because the roster it was
    /// voted on no longer exists.
    pub fn on_leave(&mut self, id: ClientId, role: Role, out: &mut Outbox) -> Result<(), GameError> {
        if !role.is_ready() {
            self.state.unready = self.state.unready.saturating_sub(1);
        }
        if self.state.robber == Some(id) {
            self.state.robber = None;
        }
        out.send(Recipient::All, &Message::PlayerDisconnect { id })?;

        if self.state.starting {
            self.state.starting = false;
            self.state.countdown = Duration::ZERO;
            out.send(Recipient::All, &Message::VetoStart { id })?;
            tracing::info!(%id, "countdown cancelled by disconnect");
        }

        tracing::info!(%id, %role, unready = self.state.unready, "client left staging");
        Ok(())
    }

    /// Handles a start vote from `voter`.
    ///
    /// Returns `true` if the vote started the countdown.
    pub fn vote(
        &mut self,
        registry: &SessionRegistry,
        voter: ClientId,
        out: &mut Outbox,
    ) -> Result<bool, GameError> {
        if self.state.starting {
            tracing::debug!(%voter, "vote ignored: countdown already running");
            return Ok(false);
        }
        if registry.len() < self.config.min_players {
            tracing::debug!(%voter, clients = registry.len(), "vote ignored: not enough clients");
            return Ok(false);
        }
        if self.state.unready > 0 {
            tracing::debug!(%voter, unready = self.state.unready, "vote ignored: clients not ready");
            return Ok(false);
        }

        self.state.starting = true;
        self.state.countdown = Duration::ZERO;
        out.send(Recipient::All, &Message::VoteToStart { id: voter })?;
        tracing::info!(%voter, "client voted to start; countdown running");
        Ok(true)
    }

    /// Handles a veto from `voter`. Returns `true` if a countdown was cancelled.
    pub fn veto(&mut self, voter: ClientId, out: &mut Outbox) -> Result<bool, GameError> {
        if !self.state.starting {
            tracing::debug!(%voter, "veto ignored: no countdown running");
            return Ok(false);
        }

        self.state.starting = false;
        out.send(Recipient::All, &Message::VetoStart { id: voter })?;
        tracing::info!(%voter, "client vetoed the start");
        Ok(true)
    }

    /// Handles `requester` asking for `role`.
    ///
    /// Returns `true` if the role was granted and broadcast.
    pub fn change_role(
        &mut self,
        registry: &mut SessionRegistry,
        requester: ClientId,
        role: Role,
        out: &mut Outbox,
    ) -> Result<bool, GameError> {
        if self.state.starting {
            tracing::debug!(%requester, %role, "role change ignored: roles are frozen");
            return Ok(false);
        }

        if role.is_exclusive() {
            if let Some(holder) = self.state.robber.filter(|h| *h != requester) {
                out.send(
                    Recipient::Client(requester),
                    &Message::RoleChangeRejection { holder },
                )?;
                tracing::info!(%requester, %holder, "exclusive role already taken");
                return Ok(false);
            }
        }

        let previous = registry.set_role(requester, role)?;

        match (previous.is_ready(), role.is_ready()) {
            (false, true) => self.state.unready = self.state.unready.saturating_sub(1),
            (true, false) => self.state.unready += 1,
            _ => {}
        }
        if previous.is_exclusive() && !role.is_exclusive() {
            self.state.robber = None;
        }
        if role.is_exclusive() {
            self.state.robber = Some(requester);
        }

        out.send(Recipient::All, &Message::RoleChange { id: requester, role })?;
        tracing::info!(%requester, from = %previous, to = %role, unready = self.state.unready, "role changed");
        Ok(true)
    }

    /// Advances the countdown by one tick.
    ///
    /// Returns `true` on the tick the countdown passes its threshold; by
    /// then `StartGame` is already queued for everyone.
    pub fn advance(&mut self, dt: Duration, out: &mut Outbox) -> Result<bool, GameError> {
        if !self.state.starting {
            return Ok(false);
        }

        self.state.countdown += dt;
        if self.state.countdown <= self.config.countdown {
            return Ok(false);
        }

        out.send(Recipient::All, &Message::StartGame)?;
        tracing::info!(
            countdown_ms = self.state.countdown.as_millis() as u64,
            "countdown elapsed; leaving staging"
        );
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn handle_vote(
    staging: &mut Staging,
    cx: &mut Context<'_>,
    sender: ClientId,
    _body: &[u8],
) -> Result<(), GameError> {
    staging.vote(cx.registry, sender, cx.outbox).map(drop)
}

fn handle_veto(
    staging: &mut Staging,
    cx: &mut Context<'_>,
    sender: ClientId,
    _body: &[u8],
) -> Result<(), GameError> {
    staging.veto(sender, cx.outbox).map(drop)
}

fn handle_role_change(
    staging: &mut Staging,
    cx: &mut Context<'_>,
    sender: ClientId,
    body: &[u8],
) -> Result<(), GameError> {
    let role = parse_role_request(body)?;
    staging.change_role(cx.registry, sender, role, cx.outbox).map(drop)
}
