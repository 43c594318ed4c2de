use std::time::{Duration, SystemTime};

use volley_http::HttpTransportErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The scenario reported a failure. Recorded as data; never stops the run.
    Failure(String),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRecord {
    pub name: String,
    pub passed: bool,
    /// Set when the predicate panicked instead of returning.
    pub error: Option<String>,
}

/// One HTTP exchange issued through an `IterationContext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub status: Option<u16>,
    pub transport_error: Option<HttpTransportErrorKind>,
    pub latency: Duration,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl RequestRecord {
    /// Transport errors and 4xx/5xx responses count as failed requests.
    pub fn is_failed(&self) -> bool {
        self.transport_error.is_some() || self.status.is_some_and(|s| s >= 400)
    }
}

/// What a scenario hands back at the end of an iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationOutput {
    pub outcome: Outcome,
    pub checks: Vec<CheckRecord>,
    pub requests: Vec<RequestRecord>,
    pub pacing: Option<Duration>,
}

impl IterationOutput {
    pub(crate) fn failed(reason: String) -> Self {
        Self {
            outcome: Outcome::Failure(reason),
            checks: Vec::new(),
            requests: Vec::new(),
            pacing: None,
        }
    }
}

/// A completed iteration as seen by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationResult {
    pub vu_id: u64,
    /// 0-based index within the VU.
    pub iteration: u64,
    pub started_at: SystemTime,
    pub duration: Duration,
    pub outcome: Outcome,
    pub checks: Vec<CheckRecord>,
    pub requests: Vec<RequestRecord>,
}
