//! Session logic for Stagehand.
//!
//! Everything here runs on the tick loop's task:
//!
//! - **Phase** ([`Phase`]): Staging, then Active, never back.
//! - **Dispatch** ([`Dispatcher`]): per-phase tag → handler tables with a
//!   discard-and-log default branch.
//! - **Staging** ([`Staging`]): votes, vetoes, role changes, countdown.
//! - **Active** ([`ActivePhase`]): the gameplay extension point.
//! - **Game** ([`Game`]): owns the registry and runs one pass per tick.
//!
//! ```text
//! tick ─→ drain inbound ─→ dispatch (per phase) ─→ prune departed ─→ advance phase
//!                 ↑                    │
//!            Session layer  ←── Outbox flush (after every event)
//! ```

mod active;
mod dispatch;
mod error;
mod game;
mod outbox;
mod phase;
mod staging;

pub use active::{ActivePhase, PlaceholderActive};
pub use dispatch::{Context, Dispatched, Dispatcher, Handler};
pub use error::GameError;
pub use game::{Game, StepReport};
pub use outbox::Outbox;
pub use phase::Phase;
pub use staging::{Staging, StagingConfig, StagingState};
