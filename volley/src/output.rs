use crate::cli::OutputFormat;

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, scenario: &str, config: &volley_core::TestConfig);
    fn progress(&self) -> Option<volley_core::ProgressFn>;
    fn print_summary(
        &self,
        scenario: &str,
        report: &volley_core::AggregateReport,
    ) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat, progress: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new(progress)),
        OutputFormat::Json => Box::new(json::JsonOutput { progress }),
    }
}
