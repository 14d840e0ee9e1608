//! `StagehandServer` builder and the tick loop.
//!
//! This ties the layers together: the accept task feeds streams in, and
//! one loop owns the [`Game`] and steps it on every tick.
//!
//! ```text
//! Acceptor ──streams──→ tick loop ──admit/step──→ Game ──frames──→ connection pumps
//! ```

use std::net::SocketAddr;

use stagehand_game::{ActivePhase, Game, PlaceholderActive};
use stagehand_tick::TickScheduler;
use stagehand_transport::{Accepted, Acceptor, TcpTransport};

use crate::{ServerConfig, StagehandError};

/// Builder for configuring and binding a Stagehand server.
///
/// ```rust,ignore
/// let server = StagehandServer::builder()
///     .config(ServerConfig::load("stagehand.json")?)
///     .build(PlaceholderActive::new())
///     .await?;
/// server.run().await
/// ```
#[derive(Debug, Clone, Default)]
pub struct StagehandServerBuilder {
    config: ServerConfig,
}

impl StagehandServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the configuration and binds the listener.
    pub async fn build<A: ActivePhase>(self, active: A) -> Result<StagehandServer<A>, StagehandError> {
        self.config.validate()?;
        let transport = TcpTransport::bind(&self.config.bind_addr()).await?;
        Ok(StagehandServer {
            transport,
            config: self.config,
            active,
        })
    }
}

/// A bound Stagehand server. Call [`run`](Self::run) to start ticking.
pub struct StagehandServer<A: ActivePhase = PlaceholderActive> {
    transport: TcpTransport,
    config: ServerConfig,
    active: A,
}

impl StagehandServer {
    pub fn builder() -> StagehandServerBuilder {
        StagehandServerBuilder::new()
    }
}

impl<A: ActivePhase> StagehandServer<A> {
    /// The address the listener is bound to. Useful after binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, StagehandError> {
        Ok(self.transport.local_addr()?)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs the server until the process exits.
    ///
    /// The accept task stops on its own after `max_clients` connections.
    /// Each tick, newly accepted streams are admitted, then the game takes
    /// one step.
    pub async fn run(self) -> Result<(), StagehandError> {
        let Self {
            transport,
            config,
            active,
        } = self;

        let addr = transport.local_addr()?;
        let mut acceptor = Acceptor::spawn(transport, config.max_clients);
        let mut game = Game::new(config.staging(), active);
        let mut scheduler = TickScheduler::new(config.tick());

        tracing::info!(
            %addr,
            max_clients = config.max_clients,
            tick_ms = config.tick_period_ms,
            "stagehand server running"
        );

        loop {
            let tick = scheduler.next_tick().await;

            while let Some(Accepted { stream, peer }) = acceptor.try_next() {
                match game.admit(stream) {
                    Ok(Some(id)) => tracing::info!(%id, %peer, "client admitted"),
                    Ok(None) => tracing::info!(%peer, "connection refused"),
                    Err(e) => tracing::warn!(%peer, error = %e, "could not admit client"),
                }
            }

            let report = game.step(tick.dt);
            if report.started {
                tracing::info!(tick = tick.number, "session active");
            }

            scheduler.end_pass();
        }
    }
}
