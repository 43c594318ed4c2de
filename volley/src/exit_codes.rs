#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// One or more checks failed (or iterations failed with `--fail-on-errors`).
    ChecksFailed = 10,

    /// Invalid CLI/config/scenario file (bad flags, invalid durations, zero VUs, etc.).
    InvalidInput = 30,

    /// Internal/runtime error (IO errors, engine faults).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_quality_gates(checks_failed: bool, iterations_failed: bool) -> Self {
        if checks_failed || iterations_failed {
            Self::ChecksFailed
        } else {
            Self::Success
        }
    }
}
