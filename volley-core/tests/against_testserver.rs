#![allow(clippy::unwrap_used)]

use std::time::Duration;

use volley_core::{
    CheckKind, HttpRequest, IterationContext, RequestPlan, RequestStep, StepCheck, TestConfig,
    run,
};
use volley_testserver::TestServer;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tracks_scenario_passes_every_status_check() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let url = server.urls().tracks.clone();

    let scenario = move |mut ctx: IterationContext| {
        let url = url.clone();
        async move {
            match ctx.http_get(&url).await {
                Ok(res) => {
                    ctx.check(&res, "status is 200", |r| r.status == 200);
                    ctx.success()
                }
                Err(err) => ctx.failure(err.transport_error_kind().to_string()),
            }
        }
    };
    let config =
        TestConfig::new(3, Duration::from_secs(1)).with_pacing(Duration::from_millis(100));

    let report = run(config, scenario).await?;

    assert!(report.total_iterations >= 3);
    assert_eq!(report.total_failures, 0);
    assert_eq!(report.checks["status is 200"].passes, report.total_iterations);
    assert_eq!(report.checks["status is 200"].fails, 0);
    assert_eq!(report.requests_total, report.total_iterations);
    assert_eq!(report.failed_requests_total, 0);
    assert!(report.bytes_received_total > report.bytes_sent_total);
    assert!(report.request_latency.is_some());
    assert_eq!(server.stats().tracks_total(), report.requests_total);

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn single_get_plan_against_tracks() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let plan = RequestPlan::single_get(server.urls().tracks.clone(), 200);
    let config =
        TestConfig::new(2, Duration::from_millis(800)).with_pacing(Duration::from_millis(50));

    let report = run(config, plan).await?;

    assert!(report.total_iterations > 0);
    assert_eq!(report.total_failures, 0);
    assert_eq!(report.checks["status is 200"].passes, report.total_iterations);

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_checks_fail_plan_iterations() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let plan = RequestPlan::new(vec![
        RequestStep::new(HttpRequest::get(server.urls().flaky.clone()))
            .named("flaky")
            .check(StepCheck::status(200))
            .check(StepCheck::new(CheckKind::MaxLatency(Duration::from_secs(5)))),
    ])?;
    let config =
        TestConfig::new(1, Duration::from_millis(600)).with_pacing(Duration::from_millis(20));

    let report = run(config, plan).await?;
    let status = report.checks["status is 200"];

    assert!(report.total_iterations >= 2);
    assert!(status.passes > 0 && status.fails > 0);
    assert_eq!(report.total_failures, status.fails);
    assert_eq!(report.failed_requests_total, status.fails);
    assert_eq!(
        report.failure_reasons["check failed: status is 200"],
        status.fails
    );
    assert_eq!(report.checks["latency <= 5s"].fails, 0);

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transport_errors_fail_plan_iterations() -> Result<(), Box<dyn std::error::Error>> {
    // Bind then drop to get a local port nobody listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?;
    let url = format!("http://{addr}/");
    let plan = RequestPlan::new(vec![
        RequestStep::new(HttpRequest::get(url.clone())).check(StepCheck::status(200)),
    ])?;
    let config =
        TestConfig::new(1, Duration::from_millis(300)).with_pacing(Duration::from_millis(50));

    let report = run(config, plan).await?;

    assert!(report.total_iterations > 0);
    assert_eq!(report.total_failures, report.total_iterations);
    assert_eq!(report.failed_requests_total, report.requests_total);
    // The status check never ran: the step aborted on the transport error.
    assert!(!report.checks.contains_key("status is 200"));
    assert!(
        report
            .failure_reasons
            .keys()
            .all(|k| k.starts_with(&format!("GET {url}: ")))
    );

    Ok(())
}
