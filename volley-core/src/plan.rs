use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use volley_http::{HttpRequest, HttpResponse};

use super::context::IterationContext;
use super::error::ConfigError;
use super::iteration::IterationOutput;
use super::scenario::{Scenario, ScenarioFuture};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckKind {
    Status(u16),
    StatusIn(Vec<u16>),
    BodyContains(String),
    MaxLatency(Duration),
}

impl CheckKind {
    fn passes(&self, res: &HttpResponse) -> bool {
        match self {
            Self::Status(code) => res.status == *code,
            Self::StatusIn(codes) => codes.contains(&res.status),
            Self::BodyContains(needle) => {
                needle.is_empty()
                    || res
                        .body
                        .windows(needle.len())
                        .any(|w| w == needle.as_bytes())
            }
            Self::MaxLatency(max) => res.latency <= *max,
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "status is {code}"),
            Self::StatusIn(codes) => write!(f, "status in {codes:?}"),
            Self::BodyContains(needle) => write!(f, "body contains {needle:?}"),
            Self::MaxLatency(max) => write!(f, "latency <= {max:?}"),
        }
    }
}

/// A check evaluated against a step's response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCheck {
    pub name: Option<String>,
    pub kind: CheckKind,
}

impl StepCheck {
    pub fn new(kind: CheckKind) -> Self {
        Self { name: None, kind }
    }

    pub fn status(code: u16) -> Self {
        Self::new(CheckKind::Status(code))
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The name the check is tallied under.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.kind.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestStep {
    pub name: Option<String>,
    pub request: HttpRequest,
    pub checks: Vec<StepCheck>,
}

impl RequestStep {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            name: None,
            request,
            checks: Vec::new(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn check(mut self, check: StepCheck) -> Self {
        self.checks.push(check);
        self
    }

    fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} {}", self.request.method, self.request.url),
        }
    }
}

/// Declarative scenario: run the steps in order on every iteration.
///
/// The iteration fails when a step hits a transport error (remaining steps are
/// skipped) or when any check fails.
#[derive(Debug, Clone)]
pub struct RequestPlan {
    steps: Arc<[RequestStep]>,
}

impl RequestPlan {
    pub fn new(steps: Vec<RequestStep>) -> Result<Self, ConfigError> {
        if steps.is_empty() {
            return Err(ConfigError::EmptyPlan);
        }
        Ok(Self {
            steps: steps.into(),
        })
    }

    /// `GET url` with a single `status is <expected_status>` check.
    pub fn single_get(url: impl Into<String>, expected_status: u16) -> Self {
        Self {
            steps: Arc::new([
                RequestStep::new(HttpRequest::get(url)).check(StepCheck::status(expected_status)),
            ]),
        }
    }

    pub fn steps(&self) -> &[RequestStep] {
        &self.steps
    }
}

impl Scenario for RequestPlan {
    fn iteration(&self, ctx: IterationContext) -> ScenarioFuture {
        let steps = self.steps.clone();
        Box::pin(run_steps(steps, ctx))
    }
}

async fn run_steps(steps: Arc<[RequestStep]>, mut ctx: IterationContext) -> IterationOutput {
    let mut failure: Option<String> = None;

    for step in steps.iter() {
        let res = match ctx.request(step.request.clone()).await {
            Ok(res) => res,
            Err(err) => {
                failure.get_or_insert_with(|| {
                    format!("{}: {}", step.label(), err.transport_error_kind())
                });
                break;
            }
        };

        for check in &step.checks {
            let name = check.display_name();
            if !ctx.check(&res, &name, |r| check.kind.passes(r)) {
                failure.get_or_insert_with(|| format!("check failed: {name}"));
            }
        }
    }

    match failure {
        Some(reason) => ctx.failure(reason),
        None => ctx.success(),
    }
}
