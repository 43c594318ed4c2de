use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, SystemTime};

use tokio::time::Instant;
use tracing::debug;
use volley_http::HttpClient;

use super::check::panic_message;
use super::context::IterationContext;
use super::iteration::{IterationOutput, IterationResult};
use super::scenario::Scenario;
use super::signal::StopSignal;
use super::stats::RunStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum VuState {
    /// Spawned, first iteration not started yet.
    Idle = 0,
    Running = 1,
    /// Stop requested; finishing the in-flight iteration.
    Draining = 2,
    Stopped = 3,
}

impl VuState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VuStateCounts {
    pub idle: u64,
    pub running: u64,
    pub draining: u64,
    pub stopped: u64,
}

impl VuStateCounts {
    /// VUs that have not exited yet.
    pub fn active(&self) -> u64 {
        self.idle + self.running + self.draining
    }
}

#[derive(Debug)]
pub(crate) struct VuSlot {
    id: u64,
    state: AtomicU8,
}

impl VuSlot {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            state: AtomicU8::new(VuState::Idle as u8),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn state(&self) -> VuState {
        VuState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: VuState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// `from -> to` only if the slot is still in `from`.
    pub(crate) fn transition(&self, from: VuState, to: VuState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

pub(crate) fn count_states(slots: &[VuSlot]) -> VuStateCounts {
    let mut out = VuStateCounts::default();
    for slot in slots {
        match slot.state() {
            VuState::Idle => out.idle += 1,
            VuState::Running => out.running += 1,
            VuState::Draining => out.draining += 1,
            VuState::Stopped => out.stopped += 1,
        }
    }
    out
}

/// Shared, read-only inputs of every VU task.
#[derive(Debug, Clone)]
pub struct PoolContext {
    pub stats: Arc<RunStats>,
    pub client: Arc<HttpClient>,
    /// Default pacing between iterations.
    pub pacing: Duration,
}

/// One virtual user: invoke, record, pace, repeat until stopped.
/// Returns the number of iterations it ran and recorded.
pub(crate) async fn run_vu<S: Scenario>(
    slots: Arc<[VuSlot]>,
    idx: usize,
    scenario: Arc<S>,
    ctx: PoolContext,
    stop: Arc<StopSignal>,
) -> u64 {
    let slot = &slots[idx];
    let vu_id = slot.id();
    let mut executed: u64 = 0;

    debug!(vu_id, "virtual user started");

    while !stop.is_stopped() {
        slot.transition(VuState::Idle, VuState::Running);

        let iter_ctx = IterationContext::new(vu_id, executed, ctx.client.clone());
        let started_at = SystemTime::now();
        let started = Instant::now();

        // A scenario that panics, while building its future or polling it,
        // loses only its own iteration.
        let scenario = scenario.clone();
        let iteration = tokio::spawn(async move { scenario.iteration(iter_ctx).await });
        let output = match iteration.await {
            Ok(out) => out,
            Err(err) if err.is_panic() => IterationOutput::failed(format!(
                "scenario panicked: {}",
                panic_message(err.into_panic().as_ref())
            )),
            Err(err) => IterationOutput::failed(format!("scenario task failed: {err}")),
        };
        let duration = started.elapsed();

        let pacing = output.pacing.unwrap_or(ctx.pacing);
        ctx.stats.record(IterationResult {
            vu_id,
            iteration: executed,
            started_at,
            duration,
            outcome: output.outcome,
            checks: output.checks,
            requests: output.requests,
        });
        executed += 1;

        if !pacing.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(pacing) => {}
                _ = stop.stopped() => {}
            }
        }
    }

    slot.set(VuState::Stopped);
    debug!(vu_id, iterations = executed, "virtual user stopped");

    executed
}
