//! monitor-assist CLI entry point.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;

use clap::Parser;
use monitor_assist::cli::{Cli, execute};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "MONITOR_ASSIST_LOG";

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "monitor_assist=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| fallback.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
