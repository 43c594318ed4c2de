use std::path::Path;

use anyhow::Context as _;
use tracing::debug;
use volley_core::{RequestPlan, RunConfig};

use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;
use crate::run_support::{EnvVars, expand_env, merged_env};
use crate::scenario_yaml;

pub(crate) async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.output, args.progress);
    let env = merged_env(&args.env).map_err(RunError::InvalidInput)?;

    let target = load_target(&args, &env)
        .await
        .map_err(RunError::InvalidInput)?;

    let config = target
        .config
        .overridden_by(cli_config(&args))
        .resolve()
        .context("invalid run configuration")
        .map_err(RunError::InvalidInput)?;

    debug!(scenario = %target.name, steps = target.plan.steps().len(), "scenario loaded");
    out.print_header(&target.name, &config);

    let report = volley_core::run_with_progress(config, target.plan, out.progress()).await?;

    out.print_summary(&target.name, &report)
        .map_err(RunError::RuntimeError)?;

    let checks_failed = report.checks_failed_total() > 0;
    let iterations_failed = args.fail_on_errors && report.total_failures > 0;
    Ok(ExitCode::from_quality_gates(checks_failed, iterations_failed))
}

struct Target {
    name: String,
    config: RunConfig,
    plan: RequestPlan,
}

async fn load_target(args: &RunArgs, env: &EnvVars) -> anyhow::Result<Target> {
    if let Some(path) = &args.scenario {
        let file = scenario_yaml::load(path).await?;
        let plan = file
            .to_plan(env)
            .with_context(|| format!("invalid scenario file: {}", path.display()))?;
        return Ok(Target {
            name: file.name.clone().unwrap_or_else(|| file_stem(path)),
            config: file.run_config(),
            plan,
        });
    }

    let url = args
        .url
        .as_deref()
        .context("either a scenario file or --url is required")?;
    let url = expand_env(url, env)?;
    Ok(Target {
        name: url.clone(),
        config: RunConfig::default(),
        plan: RequestPlan::single_get(url, args.expect_status),
    })
}

fn cli_config(args: &RunArgs) -> RunConfig {
    RunConfig {
        vus: args.vus,
        duration: args.duration,
        pacing: args.pacing,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scenario")
        .to_string()
}
