//! Implementation of the `atomup hold` command.

use super::lock_options;
use crate::cli::HoldArgs;
use crate::config::Config;
use crate::error::{AtomupError, Result};
use crate::locks::acquire_with_retry;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Upper bound on the time between two marker refreshes.
const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Take the lock, keep it fresh for `--seconds`, then release it untouched.
pub fn cmd_hold(args: HoldArgs, config: &Config) -> Result<()> {
    let options = lock_options(args.stale_after, config)?;
    let deadline = hold_deadline(Instant::now(), args.seconds)?;
    let mut update = acquire_with_retry(&args.target, &options, &config.retry_policy())?;

    println!("Holding {}", update.lock_path().display());

    let interval = refresh_interval(options.stale_after);
    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(interval.min(deadline - now));
        update.refresh()?;
        debug!(lock = %update.lock_path().display(), "refreshed lock marker");
    }

    update.abandon();
    update.release();
    println!("Released {}", update.lock_path().display());
    Ok(())
}

fn hold_deadline(now: Instant, seconds: u64) -> Result<Instant> {
    now.checked_add(Duration::from_secs(seconds)).ok_or_else(|| {
        AtomupError::UserError(format!("--seconds {} is too large", seconds))
    })
}

/// Refresh well within the threshold so the marker never looks stale.
fn refresh_interval(stale_after: Duration) -> Duration {
    (stale_after / 4).clamp(Duration::from_millis(10), MAX_REFRESH_INTERVAL)
}
