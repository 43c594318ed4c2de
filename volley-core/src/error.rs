pub type Result<T> = std::result::Result<T, Error>;

/// Fatal run errors. Failures of the system under test never show up here;
/// they are recorded as iteration outcomes instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("engine fault: {0}")]
    Engine(#[from] EngineFault),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("`vus` must be a positive integer")]
    InvalidVus,

    #[error("`duration` must be a positive duration")]
    InvalidDuration,

    #[error("`duration` is required")]
    MissingDuration,

    #[error("a request plan needs at least one request")]
    EmptyPlan,
}

/// The load generator itself misbehaved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineFault {
    #[error("virtual user {vu_id} task failed: {reason}")]
    VuTask { vu_id: u64, reason: String },

    #[error("total_iterations={total} but per-VU iterations sum to {per_vu_sum}")]
    IterationCountMismatch { total: u64, per_vu_sum: u64 },

    #[error("virtual user {vu_id} ran {executed} iterations but {recorded} were recorded")]
    LostIterations {
        vu_id: u64,
        executed: u64,
        recorded: u64,
    },

    #[error("total_failures={failures} exceeds total_iterations={iterations}")]
    FailuresExceedIterations { failures: u64, iterations: u64 },

    #[error("check `{0}` is present without any recorded evaluation")]
    EmptyCheckTally(String),
}
