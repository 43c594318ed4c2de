use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Run-wide stop flag. Raised once by the scheduler, read by every VU at iteration
/// boundaries. Release/acquire ordering: once a VU has seen `true` it never sees
/// `false` again.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Resolves once `stop` has been called.
    pub async fn stopped(&self) {
        loop {
            // Register before re-checking the flag so a concurrent `stop` can't slip
            // between the check and the wait.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn waiters_wake_on_stop() {
        let signal = Arc::new(StopSignal::new());
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.stopped().await })
        };

        tokio::task::yield_now().await;
        assert!(!signal.is_stopped());
        signal.stop();

        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(joined, Ok(Ok(()))));
        assert!(signal.is_stopped());
    }

    #[tokio::test]
    async fn stopped_returns_immediately_after_stop() {
        let signal = StopSignal::new();
        signal.stop();
        signal.stop();
        signal.stopped().await;
        assert!(signal.is_stopped());
    }
}
