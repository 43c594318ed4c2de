use std::process::{Command, Output};

use anyhow::Context as _;
use volley_testserver::TestServer;

fn status_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn ensure_exit(out: &Output, expected: i32) -> anyhow::Result<()> {
    anyhow::ensure!(
        status_code(out.status) == expected,
        "expected exit code {expected}, got {}\nstdout:\n{}\nstderr:\n{}",
        status_code(out.status),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}

async fn run_volley(args: Vec<String>) -> anyhow::Result<Output> {
    let exe = env!("CARGO_BIN_EXE_volley");
    tokio::task::spawn_blocking(move || Command::new(exe).args(&args).output())
        .await
        .context("spawn_blocking join")?
        .context("run volley binary")
}

fn last_json_line(out: &Output) -> anyhow::Result<serde_json::Value> {
    let stdout = String::from_utf8_lossy(&out.stdout);
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .context("no output on stdout")?;
    serde_json::from_str(line).with_context(|| format!("stdout is not JSON: {line}"))
}

#[test]
fn invalid_flags_exit_30() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_volley");

    let out = Command::new(exe)
        .arg("run")
        .arg("--url")
        .arg("http://127.0.0.1:1/")
        .arg("--duration")
        .arg("10x")
        .output()
        .context("run volley binary")?;

    ensure_exit(&out, 30)
}

#[test]
fn missing_target_exits_30() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_volley");

    let out = Command::new(exe)
        .args(["run", "--duration", "1s"])
        .output()
        .context("run volley binary")?;

    ensure_exit(&out, 30)
}

#[test]
fn help_exits_0() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_volley");

    let out = Command::new(exe)
        .args(["run", "--help"])
        .output()
        .context("run volley binary")?;

    ensure_exit(&out, 0)
}

#[tokio::test]
async fn zero_vus_exits_30_without_sending_requests() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let out = run_volley(vec![
        "run".into(),
        "--url".into(),
        server.urls().tracks.clone(),
        "--vus".into(),
        "0".into(),
        "--duration".into(),
        "1s".into(),
    ])
    .await?;

    let requests = server.stats().requests_total();
    server.shutdown().await;

    ensure_exit(&out, 30)?;
    anyhow::ensure!(requests == 0, "expected no requests, got {requests}");
    Ok(())
}

#[tokio::test]
async fn missing_duration_exits_30() -> anyhow::Result<()> {
    let out = run_volley(vec![
        "run".into(),
        "--url".into(),
        "http://127.0.0.1:1/".into(),
    ])
    .await?;

    ensure_exit(&out, 30)?;
    let stderr = String::from_utf8_lossy(&out.stderr);
    anyhow::ensure!(
        stderr.contains("`duration` is required"),
        "unexpected stderr:\n{stderr}"
    );
    Ok(())
}

#[tokio::test]
async fn passing_run_exits_0() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let out = run_volley(vec![
        "run".into(),
        "--url".into(),
        server.urls().tracks.clone(),
        "--vus".into(),
        "2".into(),
        "--duration".into(),
        "500ms".into(),
        "--pacing".into(),
        "50ms".into(),
        "--output".into(),
        "json".into(),
    ])
    .await?;

    server.shutdown().await;
    ensure_exit(&out, 0)?;

    let summary = last_json_line(&out)?;
    anyhow::ensure!(summary["kind"] == "summary", "unexpected line: {summary}");
    let total = summary["totalIterations"].as_u64().unwrap_or(0);
    anyhow::ensure!(total > 0, "expected iterations, got {summary}");
    anyhow::ensure!(
        summary["checks"]["status is 200"]["passes"].as_u64() == Some(total),
        "every iteration should pass: {summary}"
    );
    Ok(())
}

#[tokio::test]
async fn checks_failed_exit_10() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let out = run_volley(vec![
        "run".into(),
        "--url".into(),
        server.urls().status(503),
        "--duration".into(),
        "300ms".into(),
        "--pacing".into(),
        "50ms".into(),
        "--output".into(),
        "json".into(),
    ])
    .await?;

    server.shutdown().await;
    ensure_exit(&out, 10)?;

    let summary = last_json_line(&out)?;
    anyhow::ensure!(
        summary["checks"]["status is 200"]["fails"].as_u64() > Some(0),
        "expected failed checks: {summary}"
    );
    Ok(())
}
