mod cli;
mod exit_codes;
mod logging;
mod output;
mod run;
mod run_error;
mod run_support;
mod scenario_yaml;

use clap::Parser;
use clap::error::ErrorKind;
use mimalloc::MiMalloc;

use crate::cli::{Cli, Command};
use crate::exit_codes::ExitCode;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    let cli = Cli::try_parse().unwrap_or_else(|err| {
        err.print().ok();
        let code = match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Success,
            _ => ExitCode::InvalidInput,
        };
        std::process::exit(code.as_i32())
    });

    logging::init(&cli.log_level);

    let code = match cli.command {
        Command::Run(args) => run::run(args).await.unwrap_or_else(|err| {
            eprintln!("{err}");
            err.exit_code()
        }),
    };

    std::process::exit(code.as_i32());
}
