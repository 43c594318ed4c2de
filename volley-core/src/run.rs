use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};
use volley_http::HttpClient;

use super::clock::RunClock;
use super::config::TestConfig;
use super::error::{EngineFault, Result};
use super::pool::{VuPool, VuStates};
use super::progress::{ProgressFn, ProgressUpdate};
use super::report::AggregateReport;
use super::scenario::Scenario;
use super::stats::RunStats;
use super::vu::PoolContext;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Run `scenario` on `config.vus` virtual users for `config.duration`.
pub async fn run<S: Scenario>(config: TestConfig, scenario: S) -> Result<AggregateReport> {
    run_with_progress(config, scenario, None).await
}

pub async fn run_with_progress<S: Scenario>(
    config: TestConfig,
    scenario: S,
    progress: Option<ProgressFn>,
) -> Result<AggregateReport> {
    run_with_client(config, scenario, Arc::new(HttpClient::default()), progress).await
}

/// Like [`run_with_progress`], with a caller-provided HTTP client.
pub async fn run_with_client<S: Scenario>(
    config: TestConfig,
    scenario: S,
    client: Arc<HttpClient>,
    progress: Option<ProgressFn>,
) -> Result<AggregateReport> {
    config.validate()?;

    let stats = Arc::new(RunStats::default());
    let clock = RunClock::start(config.duration);

    info!(
        vus = config.vus,
        duration = ?config.duration,
        pacing = ?config.pacing,
        "run started"
    );

    let mut pool = VuPool::start(
        config.vus,
        Arc::new(scenario),
        PoolContext {
            stats: stats.clone(),
            client,
            pacing: config.pacing,
        },
    );

    let ticker = progress.map(|progress| {
        spawn_progress(progress, clock, stats.clone(), pool.observer())
    });

    clock.wait_expired().await;
    pool.signal_stop();
    info!("duration reached, draining virtual users");

    let drained = pool.await_drain().await;

    if let Some(h) = ticker {
        h.abort();
        let _ = h.await;
    }

    let executed = drained.inspect_err(|fault| warn!(%fault, "engine fault"))?;
    let report = stats
        .finalize(clock.elapsed())
        .inspect_err(|fault| warn!(%fault, "engine fault"))?;

    // Every iteration a VU ran must have reached the aggregator.
    for (vu_id, n) in executed {
        let recorded = report.iterations_per_vu.get(&vu_id).copied().unwrap_or(0);
        if recorded != n {
            let fault = EngineFault::LostIterations {
                vu_id,
                executed: n,
                recorded,
            };
            warn!(%fault, "engine fault");
            return Err(fault.into());
        }
    }

    info!(
        iterations = report.total_iterations,
        failures = report.total_failures,
        elapsed = ?report.elapsed,
        "run finished"
    );

    Ok(report)
}

fn spawn_progress(
    progress: ProgressFn,
    clock: RunClock,
    stats: Arc<RunStats>,
    vus: VuStates,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval_at(clock.started() + PROGRESS_INTERVAL, PROGRESS_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut tick_id: u64 = 0;
        let mut last_at = clock.started();
        let mut last_iterations = 0u64;

        loop {
            interval.tick().await;

            tick_id = tick_id.saturating_add(1);
            let now = Instant::now();
            let dt = now.duration_since(last_at).as_secs_f64();
            last_at = now;

            let totals = stats.totals();
            let delta = totals.iterations.saturating_sub(last_iterations);
            last_iterations = totals.iterations;

            progress(ProgressUpdate {
                tick: tick_id,
                elapsed: clock.elapsed(),
                duration: clock.duration(),
                iterations_total: totals.iterations,
                iterations_per_sec_now: if dt > 0.0 { delta as f64 / dt } else { 0.0 },
                failures_total: totals.failures,
                checks_failed_total: totals.checks_failed,
                requests_total: totals.requests,
                vus: vus.counts(),
            });
        }
    })
}
