//! DBML compiler CLI entry point.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command};
use dbml::CheckOptions;
use dbml::driver::{CliError, check_file, print_model};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("DBML_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the input had errors.
fn run(command: Command) -> Result<bool, CliError> {
    let mut stdout = std::io::stdout().lock();
    match command {
        Command::Check {
            file,
            format,
            no_records,
        } => {
            let options = CheckOptions {
                check_records: !no_records,
            };
            check_file(&file, format.into(), options, &mut stdout)
        }
        Command::Model { file } => print_model(&file, &mut stdout),
    }
}
