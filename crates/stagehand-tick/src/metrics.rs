//! Pass-time statistics.

use std::time::Duration;

/// Weight of the newest sample in [`TickMetrics::mean_pass`].
const SMOOTHING: f64 = 0.1;

/// Counters and timings kept by the scheduler.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    /// Ticks fired so far.
    pub ticks: u64,
    /// Ticks that fired noticeably late.
    pub late_ticks: u64,
    /// Ticks dropped from the schedule.
    pub dropped: u64,
    /// Smoothed pass time.
    pub mean_pass: Duration,
    /// Longest pass seen.
    pub worst_pass: Duration,
    /// Last pass time as a fraction of the period; above 1.0 is an overrun.
    pub last_load: f64,
}

impl TickMetrics {
    pub(crate) fn record_pass(&mut self, elapsed: Duration) {
        self.worst_pass = self.worst_pass.max(elapsed);
        let mean = self.mean_pass.as_secs_f64();
        self.mean_pass =
            Duration::from_secs_f64(mean + SMOOTHING * (elapsed.as_secs_f64() - mean));
    }
}
