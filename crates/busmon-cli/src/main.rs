//! Busmon CLI binary entrypoint.
//!
//! This is the main entry point for the `busmon` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use busmon_cli::cli::{Cli, Commands};
use busmon_cli::commands::{EvaluateCommand, RuleCommand, TestCommand};
use busmon_cli::output::OutputFormat;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), busmon_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let engine = busmon_cli::open_engine(&cli.rules)?;
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Rules { command } => {
            RuleCommand::new(&engine).execute(&mut stdout, &format, command)?;
        }
        Commands::Evaluate { snapshot } => {
            EvaluateCommand::new(&engine).execute(&mut stdout, &format, snapshot)?;
        }
        Commands::Test { id } => {
            TestCommand::new(&engine).execute(&mut stdout, &format, id)?;
        }
    }

    Ok(())
}
