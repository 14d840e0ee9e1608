//! Fixed-timestep pacing for the Stagehand session loop.
//!
//! The loop asks for a tick, runs one pass, and reports the pass finished:
//!
//! ```ignore
//! let mut scheduler = TickScheduler::new(TickConfig::with_period(period));
//! loop {
//!     let tick = scheduler.next_tick().await;
//!     game.step(tick.dt);
//!     scheduler.end_pass();
//! }
//! ```
//!
//! Timers in the session advance by [`Tick::dt`], never by measured time,
//! so a slow pass delays the schedule but does not stretch the countdown.

mod config;
mod metrics;
mod scheduler;

pub use config::{Budget, TickConfig, TickPolicy};
pub use metrics::TickMetrics;
pub use scheduler::{Tick, TickScheduler};
