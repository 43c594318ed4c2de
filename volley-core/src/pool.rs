use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::EngineFault;
use super::scenario::Scenario;
use super::signal::StopSignal;
use super::vu::{PoolContext, VuSlot, VuState, VuStateCounts, count_states, run_vu};

/// Read-only view of the pool's VU states, usable from other tasks.
#[derive(Debug, Clone)]
pub struct VuStates {
    slots: Arc<[VuSlot]>,
}

impl VuStates {
    pub fn states(&self) -> Vec<(u64, VuState)> {
        self.slots.iter().map(|s| (s.id(), s.state())).collect()
    }

    pub fn counts(&self) -> VuStateCounts {
        count_states(&self.slots)
    }
}

/// Owns the VU tasks of a run.
#[derive(Debug)]
pub struct VuPool {
    stop: Arc<StopSignal>,
    slots: Arc<[VuSlot]>,
    handles: Vec<JoinHandle<u64>>,
}

impl VuPool {
    /// Spawn `vus` virtual users (ids `1..=vus`), each looping over `scenario`.
    pub fn start<S: Scenario>(vus: u64, scenario: Arc<S>, ctx: PoolContext) -> Self {
        let stop = Arc::new(StopSignal::new());
        let slots: Arc<[VuSlot]> = (1..=vus).map(VuSlot::new).collect();

        let handles = (0..slots.len())
            .map(|idx| {
                tokio::spawn(run_vu(
                    slots.clone(),
                    idx,
                    scenario.clone(),
                    ctx.clone(),
                    stop.clone(),
                ))
            })
            .collect();

        debug!(vus, "virtual user pool started");

        Self {
            stop,
            slots,
            handles,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Ask every VU to stop after its current iteration. Idempotent.
    pub fn signal_stop(&self) {
        for slot in self.slots.iter() {
            // Idle VUs never start an iteration after this point.
            if !slot.transition(VuState::Running, VuState::Draining) {
                slot.transition(VuState::Idle, VuState::Draining);
            }
        }
        self.stop.stop();
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Wait until every VU task has exited. In-flight iterations are never aborted.
    ///
    /// Returns `(vu_id, iterations executed)` for each VU.
    pub async fn await_drain(&mut self) -> Result<Vec<(u64, u64)>, EngineFault> {
        let handles = std::mem::take(&mut self.handles);
        let mut executed = Vec::with_capacity(handles.len());
        let mut fault = None;

        for (slot, handle) in self.slots.iter().zip(handles) {
            match handle.await {
                Ok(n) => executed.push((slot.id(), n)),
                Err(err) => {
                    slot.set(VuState::Stopped);
                    warn!(vu_id = slot.id(), error = %err, "virtual user task failed");
                    fault.get_or_insert(EngineFault::VuTask {
                        vu_id: slot.id(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        match fault {
            Some(fault) => Err(fault),
            None => Ok(executed),
        }
    }

    pub fn states(&self) -> Vec<(u64, VuState)> {
        self.observer().states()
    }

    pub fn observer(&self) -> VuStates {
        VuStates {
            slots: self.slots.clone(),
        }
    }
}

impl Drop for VuPool {
    fn drop(&mut self) {
        // Detached VUs still stop at their next iteration boundary.
        self.stop.stop();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use volley_http::HttpClient;

    use super::*;
    use crate::{IterationContext, RunStats};

    fn pool_ctx(stats: Arc<RunStats>, pacing: Duration) -> PoolContext {
        PoolContext {
            stats,
            client: Arc::new(HttpClient::default()),
            pacing,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn drain_waits_for_every_vu_and_reports_counts() {
        let stats = Arc::new(RunStats::default());
        let calls = Arc::new(AtomicU64::new(0));
        let scenario = {
            let calls = calls.clone();
            move |ctx: IterationContext| {
                calls.fetch_add(1, Ordering::Relaxed);
                async move { ctx.success() }
            }
        };

        let mut pool = VuPool::start(
            4,
            Arc::new(scenario),
            pool_ctx(stats.clone(), Duration::from_millis(100)),
        );
        assert_eq!(pool.len(), 4);

        tokio::time::sleep(Duration::from_millis(350)).await;
        pool.signal_stop();
        pool.signal_stop();
        let executed = pool.await_drain().await.unwrap();

        assert_eq!(executed.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        let sum: u64 = executed.iter().map(|(_, n)| n).sum();
        assert_eq!(sum, calls.load(Ordering::Relaxed));
        assert_eq!(sum, stats.snapshot().total_iterations);
        assert!(pool.states().iter().all(|(_, s)| *s == VuState::Stopped));
        assert_eq!(pool.observer().counts().stopped, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_iteration_completes_after_stop() {
        let stats = Arc::new(RunStats::default());
        let scenario = |ctx: IterationContext| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            ctx.success()
        };

        let ctx = pool_ctx(stats.clone(), Duration::ZERO);
        let mut pool = VuPool::start(2, Arc::new(scenario), ctx);
        tokio::time::sleep(Duration::from_secs(1)).await;
        pool.signal_stop();
        assert!(pool.states().iter().all(|(_, s)| *s == VuState::Draining));

        let executed = pool.await_drain().await.unwrap();
        assert_eq!(executed, vec![(1, 1), (2, 1)]);
        assert_eq!(stats.snapshot().total_iterations, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_wakes_vus_sleeping_in_pacing() {
        let stats = Arc::new(RunStats::default());
        let scenario = |ctx: IterationContext| async move { ctx.success() };

        let mut pool = VuPool::start(
            3,
            Arc::new(scenario),
            pool_ctx(stats.clone(), Duration::from_secs(3600)),
        );
        tokio::time::sleep(Duration::from_secs(1)).await;

        let before = tokio::time::Instant::now();
        pool.signal_stop();
        pool.await_drain().await.unwrap();
        assert!(before.elapsed() < Duration::from_secs(1));
        assert_eq!(stats.snapshot().total_iterations, 3);
    }
}
