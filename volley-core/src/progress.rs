use std::time::Duration;

use super::vu::VuStateCounts;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Monotonic tick counter (1-based) for progress emissions.
    pub tick: u64,
    pub elapsed: Duration,
    pub duration: Duration,
    pub iterations_total: u64,
    /// Iterations/sec observed during the last progress interval.
    pub iterations_per_sec_now: f64,
    pub failures_total: u64,
    pub checks_failed_total: u64,
    pub requests_total: u64,
    pub vus: VuStateCounts,
}

impl ProgressUpdate {
    /// Fraction of the configured duration that has passed, in `0..=1`.
    pub fn fraction(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

pub type ProgressFn = std::sync::Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;
