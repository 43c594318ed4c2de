use std::collections::BTreeMap;
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckCounts {
    pub passes: u64,
    pub fails: u64,
    /// Fails caused by a panicking predicate (included in `fails`).
    pub errors: u64,
}

impl CheckCounts {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }
}

/// Latency distribution in microseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencySummary {
    pub count: u64,
    pub min_us: u64,
    pub mean_us: f64,
    pub stdev_us: f64,
    pub p50_us: u64,
    pub p90_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl LatencySummary {
    pub(crate) fn from_histogram(h: &Histogram<u64>) -> Option<Self> {
        if h.is_empty() {
            return None;
        }

        Some(Self {
            count: h.len(),
            min_us: h.min(),
            mean_us: h.mean(),
            stdev_us: h.stdev(),
            p50_us: h.value_at_quantile(0.50),
            p90_us: h.value_at_quantile(0.90),
            p95_us: h.value_at_quantile(0.95),
            p99_us: h.value_at_quantile(0.99),
            max_us: h.max(),
        })
    }
}

/// Final (or point-in-time) outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    pub total_iterations: u64,
    /// Iterations whose outcome was a failure. Failed checks alone do not count.
    pub total_failures: u64,
    pub iterations_per_vu: BTreeMap<u64, u64>,
    pub checks: BTreeMap<String, CheckCounts>,
    pub failure_reasons: BTreeMap<String, u64>,
    pub iteration_duration: Option<LatencySummary>,
    pub request_latency: Option<LatencySummary>,
    pub requests_total: u64,
    pub failed_requests_total: u64,
    pub bytes_sent_total: u64,
    pub bytes_received_total: u64,
    /// Latency samples above the histogram range, recorded at the upper bound.
    pub latency_samples_clamped: u64,
    #[serde(rename = "elapsedMs", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl AggregateReport {
    pub fn checks_failed_total(&self) -> u64 {
        self.checks.values().map(|c| c.fails).sum()
    }

    pub fn checks_total(&self) -> u64 {
        self.checks.values().map(CheckCounts::total).sum()
    }

    pub fn iterations_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_iterations as f64 / secs
        } else {
            0.0
        }
    }

    /// Reasons sorted by count (descending), then by name.
    pub fn top_failure_reasons(&self, limit: usize) -> Vec<(&str, u64)> {
        let mut out: Vec<(&str, u64)> = self
            .failure_reasons
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        out.truncate(limit);
        out
    }
}

fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn empty_report() -> AggregateReport {
        AggregateReport {
            total_iterations: 0,
            total_failures: 0,
            iterations_per_vu: BTreeMap::new(),
            checks: BTreeMap::new(),
            failure_reasons: BTreeMap::new(),
            iteration_duration: None,
            request_latency: None,
            requests_total: 0,
            failed_requests_total: 0,
            bytes_sent_total: 0,
            bytes_received_total: 0,
            latency_samples_clamped: 0,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn serializes_camel_case_with_elapsed_millis() {
        let mut report = empty_report();
        report.total_iterations = 4;
        report.elapsed = Duration::from_millis(1500);
        report.checks.insert(
            "status is 200".to_string(),
            CheckCounts {
                passes: 3,
                fails: 1,
                errors: 0,
            },
        );

        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["totalIterations"], 4);
        assert_eq!(v["elapsedMs"], 1500);
        assert_eq!(v["checks"]["status is 200"]["fails"], 1);
        assert!(v["iterationDuration"].is_null());
    }

    #[test]
    fn derived_rates_and_top_reasons() {
        let mut report = empty_report();
        report.total_iterations = 50;
        report.elapsed = Duration::from_secs(10);
        report.failure_reasons.insert("timeout".to_string(), 2);
        report.failure_reasons.insert("connect".to_string(), 5);
        report.failure_reasons.insert("body_read".to_string(), 2);

        assert!((report.iterations_per_sec() - 5.0).abs() < f64::EPSILON);
        assert_eq!(
            report.top_failure_reasons(2),
            vec![("connect", 5), ("body_read", 2)]
        );
        assert_eq!(empty_report().iterations_per_sec(), 0.0);
    }

    #[test]
    fn latency_summary_reads_histogram() {
        let mut h = Histogram::<u64>::new_with_bounds(1, 3_600_000_000, 3).unwrap();
        assert_eq!(LatencySummary::from_histogram(&h), None);

        for us in [1_000u64, 2_000, 3_000, 4_000] {
            h.record(us).unwrap();
        }
        let s = LatencySummary::from_histogram(&h).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.min_us, 1_000);
        assert!(s.max_us >= 4_000 && s.max_us < 4_010);
        assert!(s.p50_us >= 2_000 && s.p50_us < 2_010);
    }
}
