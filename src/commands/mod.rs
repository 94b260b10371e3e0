//! Command implementations for atomup.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the option overrides shared between commands.

mod clear;
mod hold;
mod replace;
mod status;

use crate::cli::Command;
use crate::config::Config;
use crate::error::{AtomupError, Result};
use crate::locks::LockOptions;
use std::time::Duration;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Replace(args) => replace::cmd_replace(args, config),
        Command::Status(args) => status::cmd_status(args, config),
        Command::Clear(args) => clear::cmd_clear(args, config),
        Command::Hold(args) => hold::cmd_hold(args, config),
    }
}

/// Staleness threshold from `--stale-after`, falling back to the config.
fn stale_after(flag: Option<u64>, config: &Config) -> Result<Duration> {
    match flag {
        Some(0) => Err(AtomupError::UserError(
            "--stale-after must be greater than 0".to_string(),
        )),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Ok(config.stale_after()),
    }
}

/// Lock options from the config with a command-line threshold override.
fn lock_options(flag: Option<u64>, config: &Config) -> Result<LockOptions> {
    let mut options = config.lock_options();
    options.stale_after = stale_after(flag, config)?;
    Ok(options)
}
