use std::sync::OnceLock;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TEMPLATE: &str = "{prefix} [ {bar:20.cyan/blue} ] {percent:>3}% {msg}";

/// Duration-bound progress bar on stderr, drawn lazily on the first tick.
pub(crate) struct HumanProgress {
    bar: OnceLock<ProgressBar>,
}

impl HumanProgress {
    pub(crate) fn new() -> Self {
        Self {
            bar: OnceLock::new(),
        }
    }

    pub(crate) fn update(&self, prefix: &str, total: Duration, elapsed: Duration, message: String) {
        let bar = self.bar.get_or_init(|| {
            let style = ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█░");
            ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr_with_hz(5))
                .with_style(style)
                .with_prefix(prefix.to_owned())
        });

        let total = millis(total);
        bar.set_length(total);
        bar.set_position(millis(elapsed).min(total));
        bar.set_message(message);
    }

    pub(crate) fn finish(&self) {
        if let Some(bar) = self.bar.get() {
            bar.finish_and_clear();
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
