use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use volley_http::{HttpClient, HttpRequest, HttpResponse};

use super::check;
use super::iteration::{IterationOutput, Outcome, RequestRecord};

/// Per-iteration handle given to a scenario: the HTTP client, the check engine, and
/// the buffer that becomes this iteration's result.
#[derive(Debug)]
pub struct IterationContext {
    vu_id: u64,
    iteration: u64,
    client: Arc<HttpClient>,
    output: IterationOutput,
}

impl IterationContext {
    pub(crate) fn new(vu_id: u64, iteration: u64, client: Arc<HttpClient>) -> Self {
        Self {
            vu_id,
            iteration,
            client,
            output: IterationOutput {
                outcome: Outcome::Success,
                checks: Vec::new(),
                requests: Vec::new(),
                pacing: None,
            },
        }
    }

    pub fn vu_id(&self) -> u64 {
        self.vu_id
    }

    /// 0-based iteration index for this VU.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub async fn http_get(&mut self, url: &str) -> volley_http::Result<HttpResponse> {
        self.request(HttpRequest::get(url)).await
    }

    /// Issue a request and keep its latency/bytes/status for the aggregate report.
    /// Errors are returned to the scenario; recording them as failures is its call.
    pub async fn request(&mut self, req: HttpRequest) -> volley_http::Result<HttpResponse> {
        let started = Instant::now();
        let res = self.client.request(req).await;

        let record = match &res {
            Ok(r) => RequestRecord {
                status: Some(r.status),
                transport_error: None,
                latency: r.latency,
                bytes_sent: r.bytes_sent,
                bytes_received: r.bytes_received,
            },
            Err(err) => RequestRecord {
                status: None,
                transport_error: Some(err.transport_error_kind()),
                latency: started.elapsed(),
                bytes_sent: 0,
                bytes_received: 0,
            },
        };
        self.output.requests.push(record);

        res
    }

    /// Evaluate `predicate(value)` as the check `name`, record it, and return the result.
    pub fn check<T: ?Sized>(
        &mut self,
        value: &T,
        name: &str,
        predicate: impl FnOnce(&T) -> bool,
    ) -> bool {
        let rec = check::evaluate(value, name, predicate);
        let passed = rec.passed;
        self.output.checks.push(rec);
        passed
    }

    /// Override the configured pacing for the sleep that follows this iteration.
    pub fn set_pacing(&mut self, pacing: Duration) {
        self.output.pacing = Some(pacing);
    }

    pub fn success(mut self) -> IterationOutput {
        self.output.outcome = Outcome::Success;
        self.output
    }

    pub fn failure(mut self, reason: impl Into<String>) -> IterationOutput {
        self.output.outcome = Outcome::Failure(reason.into());
        self.output
    }

    pub fn finish<E: Display>(self, result: Result<(), E>) -> IterationOutput {
        match result {
            Ok(()) => self.success(),
            Err(err) => self.failure(err.to_string()),
        }
    }
}
