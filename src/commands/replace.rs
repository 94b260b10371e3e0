//! Implementation of the `atomup replace` command.

use super::lock_options;
use crate::cli::ReplaceArgs;
use crate::config::Config;
use crate::error::{AtomupError, Result};
use crate::locks::acquire_with_retry;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Replace the target's content under the update lock.
///
/// The new content is read completely before the lock is taken, so a slow
/// producer on stdin never holds up other writers.
pub fn cmd_replace(args: ReplaceArgs, config: &Config) -> Result<()> {
    let options = lock_options(args.stale_after, config)?;
    let mut policy = config.retry_policy();
    if let Some(wait) = args.wait {
        policy.timeout = Duration::from_millis(wait);
    }

    let content = read_input(args.input.as_deref())?;

    let mut update = acquire_with_retry(&args.target, &options, &policy)?;
    let result = update
        .write_staged(&content)
        .and_then(|()| update.commit());
    if result.is_err() {
        update.abandon();
    }
    update.release();
    result?;

    println!(
        "Replaced {} ({} bytes)",
        update.target_path().display(),
        content.len()
    );
    Ok(())
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>> {
    match input {
        Some(path) => std::fs::read(path).map_err(|e| {
            AtomupError::UserError(format!(
                "failed to read input file '{}': {}",
                path.display(),
                e
            ))
        }),
        None => {
            let mut content = Vec::new();
            std::io::stdin()
                .read_to_end(&mut content)
                .map_err(|e| AtomupError::UserError(format!("failed to read stdin: {}", e)))?;
            Ok(content)
        }
    }
}
