use serde::Serialize;
use std::io::Write as _;
use std::sync::Arc;

use super::OutputFormatter;

pub(crate) struct JsonOutput {
    pub(crate) progress: bool,
}

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _scenario: &str, _config: &volley_core::TestConfig) {}

    fn progress(&self) -> Option<volley_core::ProgressFn> {
        if !self.progress {
            return None;
        }
        Some(Arc::new(move |u| {
            let line = build_progress_line(&u);
            emit_json_line(&line);
        }))
    }

    fn print_summary(
        &self,
        scenario: &str,
        report: &volley_core::AggregateReport,
    ) -> anyhow::Result<()> {
        let line = JsonSummaryLine {
            kind: "summary",
            scenario,
            report,
        };
        emit_json_line(&line);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub tick: u64,
    pub elapsed_ms: u64,
    pub duration_ms: u64,
    pub iterations_total: u64,
    pub iterations_per_sec: f64,
    pub failures_total: u64,
    pub checks_failed_total: u64,
    pub requests_total: u64,
    pub vus_active: u64,
    pub vus_draining: u64,
}

fn build_progress_line(u: &volley_core::ProgressUpdate) -> JsonProgressLine {
    JsonProgressLine {
        kind: "progress",
        tick: u.tick,
        elapsed_ms: u64::try_from(u.elapsed.as_millis()).unwrap_or(u64::MAX),
        duration_ms: u64::try_from(u.duration.as_millis()).unwrap_or(u64::MAX),
        iterations_total: u.iterations_total,
        iterations_per_sec: u.iterations_per_sec_now,
        failures_total: u.failures_total,
        checks_failed_total: u.checks_failed_total,
        requests_total: u.requests_total,
        vus_active: u.vus.active(),
        vus_draining: u.vus.draining,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonSummaryLine<'a> {
    pub kind: &'static str,
    pub scenario: &'a str,
    #[serde(flatten)]
    pub report: &'a volley_core::AggregateReport,
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
