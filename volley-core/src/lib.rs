#![forbid(unsafe_code)]

mod check;
mod clock;
mod config;
mod context;
mod error;
mod iteration;
mod plan;
mod pool;
mod progress;
mod report;
mod run;
mod scenario;
mod signal;
mod stats;
mod vu;

pub use clock::RunClock;
pub use config::{RunConfig, TestConfig};
pub use context::IterationContext;
pub use error::{ConfigError, EngineFault, Error, Result};
pub use iteration::{CheckRecord, IterationOutput, IterationResult, Outcome, RequestRecord};
pub use plan::{CheckKind, RequestPlan, RequestStep, StepCheck};
pub use pool::{VuPool, VuStates};
pub use progress::{ProgressFn, ProgressUpdate};
pub use report::{AggregateReport, CheckCounts, LatencySummary};
pub use run::{run, run_with_client, run_with_progress};
pub use scenario::{Scenario, ScenarioFuture};
pub use signal::StopSignal;
pub use stats::{MAX_FAILURE_REASONS, OTHER_FAILURE_REASON, RunStats, RunTotals};
pub use vu::{PoolContext, VuState, VuStateCounts};

pub use bytes::Bytes;
pub use http::Method;
pub use volley_http::{
    Error as HttpError, HttpClient, HttpRequest, HttpResponse, HttpTransportErrorKind,
};
