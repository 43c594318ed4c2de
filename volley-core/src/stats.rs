use std::collections::BTreeMap;
use std::time::Duration;

use ahash::AHashMap;
use hdrhistogram::Histogram;
use parking_lot::Mutex;

use super::error::EngineFault;
use super::iteration::{IterationResult, Outcome};
use super::report::{AggregateReport, CheckCounts, LatencySummary};

/// Distinct failure reasons kept verbatim; the rest are folded into one bucket.
pub const MAX_FAILURE_REASONS: usize = 64;
pub const OTHER_FAILURE_REASON: &str = "(other)";

// 1µs..1h in microseconds, 3 significant digits.
const HIST_LOW_US: u64 = 1;
const HIST_HIGH_US: u64 = 3_600_000_000;
const HIST_SIGFIG: u8 = 3;

/// Live counters for progress reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub iterations: u64,
    pub failures: u64,
    pub checks_failed: u64,
    pub requests: u64,
}

#[derive(Debug)]
struct Aggregate {
    totals: RunTotals,
    iterations_per_vu: AHashMap<u64, u64>,
    checks: AHashMap<String, CheckCounts>,
    failure_reasons: AHashMap<String, u64>,
    iteration_us: Histogram<u64>,
    request_us: Histogram<u64>,
    failed_requests_total: u64,
    bytes_sent_total: u64,
    bytes_received_total: u64,
    latency_samples_clamped: u64,
    elapsed: Duration,
}

impl Aggregate {
    fn record_latency(hist: &mut Histogram<u64>, clamped: &mut u64, d: Duration) {
        let us = u64::try_from(d.as_micros()).unwrap_or(u64::MAX);
        if us > hist.high() {
            *clamped += 1;
        }
        hist.saturating_record(us);
    }

    fn record_failure_reason(&mut self, reason: &str) {
        if let Some(n) = self.failure_reasons.get_mut(reason) {
            *n += 1;
            return;
        }
        let key = if self.failure_reasons.len() < MAX_FAILURE_REASONS {
            reason
        } else {
            OTHER_FAILURE_REASON
        };
        *self.failure_reasons.entry(key.to_string()).or_default() += 1;
    }
}

/// Thread-safe result aggregator shared by every VU of a run.
///
/// All counters live behind a single lock, so a snapshot never observes a
/// half-recorded iteration.
#[derive(Debug)]
pub struct RunStats {
    inner: Mutex<Aggregate>,
}

impl Default for RunStats {
    fn default() -> Self {
        fn new_hist() -> Histogram<u64> {
            Histogram::<u64>::new_with_bounds(HIST_LOW_US, HIST_HIGH_US, HIST_SIGFIG)
                .unwrap_or_else(|err| panic!("failed to init histogram: {err}"))
        }

        Self {
            inner: Mutex::new(Aggregate {
                totals: RunTotals::default(),
                iterations_per_vu: AHashMap::new(),
                checks: AHashMap::new(),
                failure_reasons: AHashMap::new(),
                iteration_us: new_hist(),
                request_us: new_hist(),
                failed_requests_total: 0,
                bytes_sent_total: 0,
                bytes_received_total: 0,
                latency_samples_clamped: 0,
                elapsed: Duration::ZERO,
            }),
        }
    }
}

impl RunStats {
    pub fn record(&self, result: IterationResult) {
        let mut agg = self.inner.lock();
        let agg = &mut *agg;

        agg.totals.iterations += 1;
        *agg.iterations_per_vu.entry(result.vu_id).or_default() += 1;
        Aggregate::record_latency(
            &mut agg.iteration_us,
            &mut agg.latency_samples_clamped,
            result.duration,
        );

        if let Outcome::Failure(reason) = &result.outcome {
            agg.totals.failures += 1;
            agg.record_failure_reason(reason);
        }

        for check in result.checks {
            let counts = agg.checks.entry(check.name).or_default();
            if check.passed {
                counts.passes += 1;
            } else {
                counts.fails += 1;
                agg.totals.checks_failed += 1;
                if check.error.is_some() {
                    counts.errors += 1;
                }
            }
        }

        for req in &result.requests {
            agg.totals.requests += 1;
            if req.is_failed() {
                agg.failed_requests_total += 1;
            }
            agg.bytes_sent_total += req.bytes_sent;
            agg.bytes_received_total += req.bytes_received;
            Aggregate::record_latency(
                &mut agg.request_us,
                &mut agg.latency_samples_clamped,
                req.latency,
            );
        }
    }

    pub fn totals(&self) -> RunTotals {
        self.inner.lock().totals
    }

    /// Consistent point-in-time copy. `elapsed` stays zero until `finalize`.
    pub fn snapshot(&self) -> AggregateReport {
        let agg = self.inner.lock();

        AggregateReport {
            total_iterations: agg.totals.iterations,
            total_failures: agg.totals.failures,
            iterations_per_vu: agg
                .iterations_per_vu
                .iter()
                .map(|(k, v)| (*k, *v))
                .collect(),
            checks: agg
                .checks
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect::<BTreeMap<_, _>>(),
            failure_reasons: agg
                .failure_reasons
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            iteration_duration: LatencySummary::from_histogram(&agg.iteration_us),
            request_latency: LatencySummary::from_histogram(&agg.request_us),
            requests_total: agg.totals.requests,
            failed_requests_total: agg.failed_requests_total,
            bytes_sent_total: agg.bytes_sent_total,
            bytes_received_total: agg.bytes_received_total,
            latency_samples_clamped: agg.latency_samples_clamped,
            elapsed: agg.elapsed,
        }
    }

    /// Stamp the run's wall time and verify the report's internal consistency.
    pub fn finalize(&self, elapsed: Duration) -> Result<AggregateReport, EngineFault> {
        self.inner.lock().elapsed = elapsed;
        let report = self.snapshot();
        verify(&report)?;
        Ok(report)
    }
}

fn verify(report: &AggregateReport) -> Result<(), EngineFault> {
    let per_vu_sum: u64 = report.iterations_per_vu.values().sum();
    if per_vu_sum != report.total_iterations {
        return Err(EngineFault::IterationCountMismatch {
            total: report.total_iterations,
            per_vu_sum,
        });
    }

    if report.total_failures > report.total_iterations {
        return Err(EngineFault::FailuresExceedIterations {
            failures: report.total_failures,
            iterations: report.total_iterations,
        });
    }

    if let Some((name, _)) = report.checks.iter().find(|(_, c)| c.total() == 0) {
        return Err(EngineFault::EmptyCheckTally(name.clone()));
    }

    Ok(())
}
