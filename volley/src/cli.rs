use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10s, 250ms, 1m)".to_string());
    }
    // Bare integers are seconds.
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s)
        .map_err(|err| format!("invalid duration '{s}' (expected e.g. 10s, 250ms, 1m): {err}"))
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    HumanReadable,
    /// JSON summary (and NDJSON progress lines with --progress) on stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "volley",
    author,
    version,
    about = "Virtual-user HTTP load generator",
    long_about = "volley runs a scenario on a fixed number of virtual users for a fixed duration.\n\nEach virtual user loops independently: run the scenario's requests, evaluate the checks, sleep for the pacing interval, repeat. When the duration is up, in-flight iterations finish and a summary is printed.\n\n`${NAME}` in scenario URLs, headers and bodies is replaced from the process environment; use `--env KEY=VALUE` to add/override values.",
    after_help = "Examples:\n  volley run --url http://localhost:8000/api/tracks/ --vus 20 --duration 30s --pacing 1s\n  volley run scenarios/tracks.yaml\n  volley run scenarios/tracks.yaml --vus 5 --output json\n  volley run scenarios/tracks.yaml --env BASE_URL=https://staging.example.com"
)]
pub struct Cli {
    /// Log filter when VOLLEY_LOG / RUST_LOG are unset (e.g. info, volley_core=debug)
    #[arg(long, global = true, value_name = "FILTER", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a load test
    #[command(
        long_about = "Run a YAML scenario file, or a single GET request given with --url.\n\nCLI flags override values from the scenario file."
    )]
    Run(RunArgs),
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["scenario", "url"])))]
pub struct RunArgs {
    /// Path to the scenario file (.yaml)
    pub scenario: Option<PathBuf>,

    /// Run a single GET request per iteration instead of a scenario file
    #[arg(long)]
    pub url: Option<String>,

    /// Expected status for --url (checked as "status is <N>")
    #[arg(long, value_name = "N", default_value_t = 200, requires = "url")]
    pub expect_status: u16,

    /// Number of virtual users (otherwise `vus` from the file, or 1)
    #[arg(long)]
    pub vus: Option<u64>,

    /// Test duration (e.g. 10s, 250ms, 1m)
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Sleep between two iterations of the same virtual user (e.g. 1s)
    #[arg(long, value_parser = parse_duration)]
    pub pacing: Option<Duration>,

    /// Add/override env vars used for `${NAME}` expansion (repeatable, KEY=VALUE).
    /// CLI-provided vars override the current process env.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Report progress once per second while running
    #[arg(long)]
    pub progress: bool,

    /// Exit with code 10 when any iteration failed, even if every check passed
    #[arg(long)]
    pub fail_on_errors: bool,
}
