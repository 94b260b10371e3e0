//! CLI argument parsing for atomup.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Atomup: atomic updates of shared files, coordinated by lock files.
///
/// Writers take `<file>.LCK`, stage the new content in `<file>.NEW` and
/// rename it over `<file>`. Readers never see a partial file.
#[derive(Parser, Debug)]
#[command(name = "atomup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging for atomup.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for atomup.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Atomically replace a file's content.
    ///
    /// Reads the new content from --input or stdin, takes the lock,
    /// stages the content and commits it with a rename.
    Replace(ReplaceArgs),

    /// Show the lock state of a file.
    ///
    /// Reports the marker's age, holder and whether it is stale.
    Status(StatusArgs),

    /// Remove a leftover lock.
    ///
    /// Stale locks are removed directly; a fresh lock requires --force.
    Clear(ClearArgs),

    /// Take the lock and hold it for a while.
    ///
    /// Keeps the marker fresh while held, then releases without
    /// modifying the file. Useful to test other writers' behavior.
    Hold(HoldArgs),
}

/// Arguments for the `replace` command.
#[derive(Parser, Debug)]
pub struct ReplaceArgs {
    /// File to update.
    pub target: PathBuf,

    /// Read the new content from this file instead of stdin.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Override the staleness threshold, in seconds.
    #[arg(long, value_name = "SECS")]
    pub stale_after: Option<u64>,

    /// Keep retrying a busy lock for this many milliseconds.
    #[arg(long, value_name = "MS")]
    pub wait: Option<u64>,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// File whose lock to inspect.
    pub target: PathBuf,

    /// Override the staleness threshold, in seconds.
    #[arg(long, value_name = "SECS")]
    pub stale_after: Option<u64>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `clear` command.
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// File whose lock should be cleared.
    pub target: PathBuf,

    /// Clear the lock even if it is not stale.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `hold` command.
#[derive(Parser, Debug)]
pub struct HoldArgs {
    /// File to lock.
    pub target: PathBuf,

    /// How long to hold the lock.
    #[arg(long, value_name = "N")]
    pub seconds: u64,

    /// Override the staleness threshold, in seconds.
    #[arg(long, value_name = "SECS")]
    pub stale_after: Option<u64>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
