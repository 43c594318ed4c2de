use std::fmt::Write as _;

use volley_core::{AggregateReport, LatencySummary};

use super::format::*;

const TOP_FAILURE_REASONS: usize = 10;

pub(crate) fn render(scenario: &str, r: &AggregateReport) -> String {
    let mut out = String::new();

    writeln!(&mut out, "summary: {scenario}").ok();
    writeln!(&mut out, "  elapsed: {}", format_duration(r.elapsed)).ok();

    let per_vu_min = r.iterations_per_vu.values().min().copied().unwrap_or(0);
    let per_vu_max = r.iterations_per_vu.values().max().copied().unwrap_or(0);
    writeln!(
        &mut out,
        "  iterations: {} ({}/s) per_vu min={per_vu_min} max={per_vu_max}",
        r.total_iterations,
        format_rate(r.iterations_per_sec())
    )
    .ok();

    writeln!(&mut out, "  failures: {}", r.total_failures).ok();
    for (reason, count) in r.top_failure_reasons(TOP_FAILURE_REASONS) {
        writeln!(&mut out, "    {reason}: {count}").ok();
    }
    if r.failure_reasons.len() > TOP_FAILURE_REASONS {
        writeln!(
            &mut out,
            "    ... {} more",
            r.failure_reasons.len() - TOP_FAILURE_REASONS
        )
        .ok();
    }

    if !r.checks.is_empty() {
        out.push_str("  checks\n");
        for (name, c) in &r.checks {
            let mark = if c.fails > 0 { '✗' } else { '✓' };
            write!(&mut out, "    {mark} {name}: pass={} fail={}", c.passes, c.fails).ok();
            if c.errors > 0 {
                write!(&mut out, " (errors {})", c.errors).ok();
            }
            out.push('\n');
        }
    }

    writeln!(
        &mut out,
        "  requests: {} (failed {})",
        r.requests_total, r.failed_requests_total
    )
    .ok();
    writeln!(
        &mut out,
        "  bytes: recv {} sent {}",
        format_bytes(r.bytes_received_total),
        format_bytes(r.bytes_sent_total)
    )
    .ok();

    render_latency(&mut out, "iteration_duration", r.iteration_duration.as_ref());
    render_latency(&mut out, "request_latency", r.request_latency.as_ref());

    if r.latency_samples_clamped > 0 {
        writeln!(
            &mut out,
            "  latency_samples_clamped: {}",
            r.latency_samples_clamped
        )
        .ok();
    }

    out
}

fn render_latency(out: &mut String, label: &str, s: Option<&LatencySummary>) {
    let Some(s) = s else {
        writeln!(out, "  {label}: n/a").ok();
        return;
    };

    writeln!(
        out,
        "  {label} = p50={} p90={} p95={} p99={} mean={} max={} (n={})",
        format_micros(s.p50_us),
        format_micros(s.p90_us),
        format_micros(s.p95_us),
        format_micros(s.p99_us),
        format_micros_f64(s.mean_us),
        format_micros(s.max_us),
        s.count
    )
    .ok();
}
