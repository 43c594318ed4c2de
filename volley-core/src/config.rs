use std::time::Duration;

use tokio::time::Instant;

use super::error::ConfigError;

/// Resolved run shape. Immutable once handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfig {
    pub vus: u64,
    pub duration: Duration,
    /// Default delay between two iterations of the same VU. Scenarios may override it
    /// per iteration.
    pub pacing: Duration,
}

impl TestConfig {
    pub fn new(vus: u64, duration: Duration) -> Self {
        Self {
            vus,
            duration,
            pacing: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vus == 0 {
            return Err(ConfigError::InvalidVus);
        }
        // The deadline must be representable on the monotonic clock.
        if self.duration.is_zero() || Instant::now().checked_add(self.duration).is_none() {
            return Err(ConfigError::InvalidDuration);
        }
        Ok(())
    }
}

/// Partially specified run options from a single source (scenario file or CLI flags).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub vus: Option<u64>,
    pub duration: Option<Duration>,
    pub pacing: Option<Duration>,
}

impl RunConfig {
    /// Layer `overrides` on top of `self`; set fields in `overrides` win.
    #[must_use]
    pub fn overridden_by(self, overrides: RunConfig) -> RunConfig {
        RunConfig {
            vus: overrides.vus.or(self.vus),
            duration: overrides.duration.or(self.duration),
            pacing: overrides.pacing.or(self.pacing),
        }
    }

    /// Apply defaults (`vus=1`, `pacing=0`) and validate.
    pub fn resolve(self) -> Result<TestConfig, ConfigError> {
        let duration = self.duration.ok_or(ConfigError::MissingDuration)?;
        let cfg = TestConfig {
            vus: self.vus.unwrap_or(1),
            duration,
            pacing: self.pacing.unwrap_or(Duration::ZERO),
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
