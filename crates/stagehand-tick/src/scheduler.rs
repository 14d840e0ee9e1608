//! The tick clock.

use std::time::Duration;

use tokio::time::Instant;

use crate::{TickConfig, TickMetrics, TickPolicy};

/// One fired tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Sequence number, from 1.
    pub number: u64,
    /// Simulation step; always the configured period.
    pub dt: Duration,
    /// Fired more than a tenth of a period after it was due.
    pub late: bool,
    /// Ticks dropped from the schedule because of this one.
    pub dropped: u64,
}

/// Decides when the tick after a late one is due.
///
/// `due` is when the current tick should have fired and `now` when it
/// actually did. Returns the next deadline and how many whole periods were
/// dropped.
fn reschedule(policy: TickPolicy, period: Duration, due: Instant, now: Instant) -> (Instant, u64) {
    let behind = (now.saturating_duration_since(due).as_nanos() / period.as_nanos()) as u64;
    match policy {
        TickPolicy::Skip => (now + period, behind),
        TickPolicy::CatchUp { max_catchup } if behind <= u64::from(max_catchup) => {
            (due + period, 0)
        }
        TickPolicy::CatchUp { max_catchup } => (now + period, behind - u64::from(max_catchup)),
    }
}

/// Paces the session loop at a fixed period.
///
/// Deadlines use Tokio's clock so tests can pause and advance time; pass
/// durations use the wall clock.
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    fired: u64,
    deadline: Instant,
    pass_started: Option<std::time::Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// The first tick is due immediately.
    pub fn new(config: TickConfig) -> Self {
        let config = config.normalized();
        tracing::debug!(
            period_ms = config.period.as_millis() as u64,
            policy = ?config.policy,
            "tick scheduler ready"
        );
        Self {
            config,
            fired: 0,
            deadline: Instant::now(),
            pass_started: None,
            metrics: TickMetrics::default(),
        }
    }

    /// Sleeps until the next deadline, then fires the tick.
    pub async fn next_tick(&mut self) -> Tick {
        let due = self.deadline;
        tokio::time::sleep_until(due).await;

        let now = Instant::now();
        let period = self.config.period;
        let (deadline, dropped) = reschedule(self.config.policy, period, due, now);
        self.deadline = deadline;
        self.fired += 1;
        self.pass_started = Some(std::time::Instant::now());

        let late_by = now.saturating_duration_since(due);
        let late = late_by > period / 10;
        self.metrics.ticks += 1;
        self.metrics.dropped += dropped;
        if late {
            self.metrics.late_ticks += 1;
        }
        if dropped > 0 {
            tracing::warn!(
                tick = self.fired,
                late_ms = late_by.as_millis() as u64,
                dropped,
                "ticks dropped after a slow pass"
            );
        }
        tracing::trace!(tick = self.fired, late, "tick");

        Tick {
            number: self.fired,
            dt: period,
            late,
            dropped,
        }
    }

    /// Marks the end of the pass started by the last [`next_tick`](Self::next_tick).
    ///
    /// Logs passes that eat into the budget and updates the metrics. Does
    /// nothing if no pass is open.
    pub fn end_pass(&mut self) {
        let Some(started) = self.pass_started.take() else {
            return;
        };
        let elapsed = started.elapsed();
        let period = self.config.period;
        let load = elapsed.as_secs_f64() / period.as_secs_f64();
        self.metrics.last_load = load;

        let budget = self.config.budget;
        if load >= budget.critical {
            tracing::warn!(
                tick = self.fired,
                elapsed_us = elapsed.as_micros() as u64,
                period_us = period.as_micros() as u64,
                "pass overran its tick"
            );
        } else if load >= budget.warn {
            tracing::debug!(
                tick = self.fired,
                load_pct = (load * 100.0) as u64,
                "pass close to its budget"
            );
        }

        if self.config.collect_metrics {
            self.metrics.record_pass(elapsed);
        }
    }

    /// Ticks fired so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(100);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_on_time_tick_keeps_grid() {
        let due = Instant::now();
        for policy in [TickPolicy::Skip, TickPolicy::CatchUp { max_catchup: 3 }] {
            let (next, dropped) = reschedule(policy, PERIOD, due, due + ms(5));
            assert_eq!(dropped, 0);
            match policy {
                TickPolicy::Skip => assert_eq!(next, due + ms(105)),
                TickPolicy::CatchUp { .. } => assert_eq!(next, due + PERIOD),
            }
        }
    }

    #[test]
    fn test_skip_drops_whole_periods() {
        let due = Instant::now();
        let (next, dropped) = reschedule(TickPolicy::Skip, PERIOD, due, due + ms(250));
        assert_eq!(next, due + ms(350));
        assert_eq!(dropped, 2);
    }

    #[test]
    fn test_catch_up_beyond_cap_drops_the_excess() {
        let due = Instant::now();
        let policy = TickPolicy::CatchUp { max_catchup: 1 };
        let (next, dropped) = reschedule(policy, PERIOD, due, due + ms(350));
        assert_eq!(next, due + ms(450));
        assert_eq!(dropped, 2);
    }
}
