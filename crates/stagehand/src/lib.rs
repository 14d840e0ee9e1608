//! # Stagehand
//!
//! A small tick-driven session server. Clients connect over TCP, pick roles
//! in a staging lobby, vote to start, and after a countdown the session
//! moves to its active phase, where the embedding application's
//! [`ActivePhase`](stagehand_game::ActivePhase) takes over.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stagehand::prelude::*;
//!
//! # async fn start() -> Result<(), StagehandError> {
//! let server = StagehandServer::builder()
//!     .config(ServerConfig::default())
//!     .build(PlaceholderActive::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod server;
pub mod telemetry;

pub use config::{ConfigError, ServerConfig};
pub use error::StagehandError;
pub use server::{StagehandServer, StagehandServerBuilder};

/// Re-exports everything an embedding application usually needs.
pub mod prelude {
    pub use crate::telemetry::init_tracing;
    pub use crate::{ConfigError, ServerConfig, StagehandError, StagehandServer, StagehandServerBuilder};

    pub use stagehand_game::{
        ActivePhase, Context, Dispatcher, GameError, Outbox, Phase, PlaceholderActive,
        StagingConfig,
    };
    pub use stagehand_protocol::{ClientId, Frame, Message, MessageType, Recipient, Role};
    pub use stagehand_session::SessionRegistry;
    pub use stagehand_tick::TickPolicy;
}
