use std::sync::Arc;

mod format;
mod progress;
mod summary;

use format::{format_duration, format_rate};
use progress::HumanProgress;
use summary::render;

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Option<Arc<HumanProgress>>,
}

impl HumanReadableOutput {
    pub(crate) fn new(progress: bool) -> Self {
        Self {
            progress: progress.then(|| Arc::new(HumanProgress::new())),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, scenario: &str, config: &volley_core::TestConfig) {
        println!("scenario: {scenario}");
        println!(
            "vus={} duration={} pacing={}",
            config.vus,
            humantime::format_duration(config.duration),
            humantime::format_duration(config.pacing)
        );
        println!();
    }

    fn progress(&self) -> Option<volley_core::ProgressFn> {
        let progress = self.progress.clone()?;

        Some(Arc::new(move |u| {
            let message = format!(
                "vus={}/{} elapsed={} iters={} iters/s={} failures={} checks_failed={}",
                u.vus.active(),
                u.vus.active() + u.vus.stopped,
                format_duration(u.elapsed),
                u.iterations_total,
                format_rate(u.iterations_per_sec_now),
                u.failures_total,
                u.checks_failed_total,
            );
            progress.update("run", u.duration, u.elapsed, message);
        }))
    }

    fn print_summary(
        &self,
        scenario: &str,
        report: &volley_core::AggregateReport,
    ) -> anyhow::Result<()> {
        if let Some(p) = &self.progress {
            p.finish();
        }
        print!("{}", render(scenario, report));
        Ok(())
    }
}
