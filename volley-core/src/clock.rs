use std::time::Duration;

use tokio::time::Instant;

/// Monotonic run clock. Started once by the scheduler; the deadline never moves.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    started: Instant,
    duration: Duration,
}

impl RunClock {
    pub fn start(duration: Duration) -> Self {
        Self::start_at(Instant::now(), duration)
    }

    pub fn start_at(started: Instant, duration: Duration) -> Self {
        Self { started, duration }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn deadline(&self) -> Instant {
        self.started + self.duration
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline()
    }

    pub async fn wait_expired(&self) {
        tokio::time::sleep_until(self.deadline()).await;
    }
}
