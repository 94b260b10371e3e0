//! Atomup: atomic updates of shared files, coordinated by lock files.
//!
//! This is the main entry point for the `atomup` CLI. It parses arguments,
//! loads configuration, installs logging, dispatches to the appropriate
//! command handler, and handles errors with proper exit codes.

use atomup::cli::Cli;
use atomup::config::Config;
use atomup::error::Result;
use atomup::{commands, exit_codes, telemetry};
use std::process::ExitCode;

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if cli.verbose {
        config.log_filter = "atomup=debug".to_string();
    }
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    if let Err(err) = telemetry::initialise(&config) {
        eprintln!("Error: {}", err);
        return ExitCode::from(exit_codes::USER_ERROR as u8);
    }

    match commands::dispatch(cli.command, &config) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
