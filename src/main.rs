use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod assist;
mod cli;
mod config;
mod discovery;
mod error;
mod lm;
mod model;
mod probe;
mod spec_doc;
mod store;
mod util;
mod verdict;
mod workflow;

use cli::{Command, RootArgs};
use workflow::WorkbenchContext;

fn main() -> ExitCode {
    let args = RootArgs::parse();
    setup_tracing(args.global.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = error::exit_code_for(&err);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(args: &RootArgs) -> anyhow::Result<()> {
    let load = || WorkbenchContext::load(&args.global);
    match &args.command {
        Command::Init(init) => workflow::run_init(&args.global, init),
        Command::Project(command) => workflow::run_project(&load()?, command),
        Command::System(command) => workflow::run_system(&load()?, command),
        Command::Scenario(command) => workflow::run_scenario(&load()?, command),
        Command::Ai(command) => workflow::run_ai(&load()?, command),
        Command::Reset(reset) => workflow::run_reset(&load()?, reset),
    }
}

/// Logs go to stderr so stdout stays parseable; `RUST_LOG` wins over `--verbose`.
fn setup_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
