//! Scheduler settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the scheduler recovers when a pass runs long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickPolicy {
    /// Fire the late tick at once and restart the period from there.
    /// Missed ticks are dropped, so the schedule drifts under load.
    #[default]
    Skip,
    /// Replay missed ticks back to back to stay on the planned grid. More
    /// than `max_catchup` missed ticks behaves like [`Skip`](Self::Skip).
    CatchUp { max_catchup: u32 },
}

/// Fractions of the period at which a pass gets logged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Budget {
    /// Warn once a pass uses this much of the period.
    pub warn: f64,
    /// Report a pass as over budget from this fraction on.
    pub critical: f64,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            warn: 0.8,
            critical: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Fixed length of one tick, and the `dt` every pass advances by.
    pub period: Duration,
    pub policy: TickPolicy,
    pub budget: Budget,
    /// Keep pass-time statistics in [`TickMetrics`](crate::TickMetrics).
    pub collect_metrics: bool,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self::with_period(Duration::from_millis(100))
    }
}

impl TickConfig {
    /// Shortest period the scheduler will run with.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            policy: TickPolicy::Skip,
            budget: Budget::default(),
            collect_metrics: true,
        }
    }

    /// Period for `hz` ticks per second; zero counts as 1 Hz.
    pub fn with_rate(hz: u32) -> Self {
        Self::with_period(Duration::from_secs(1) / hz.max(1))
    }

    /// Pulls out-of-range settings back into range.
    ///
    /// The period is raised to [`MIN_PERIOD`](Self::MIN_PERIOD); budget
    /// fractions are kept within `0.0..=1.0` with `warn <= critical`.
    pub fn normalized(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            tracing::warn!(
                period_us = self.period.as_micros() as u64,
                "tick period too short; using the minimum"
            );
            self.period = Self::MIN_PERIOD;
        }
        let critical = self.budget.critical.clamp(0.0, 1.0);
        self.budget = Budget {
            warn: self.budget.warn.clamp(0.0, critical),
            critical,
        };
        self
    }
}
