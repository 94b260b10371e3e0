//! Caller-side waiting around `acquire`.
//!
//! `acquire` itself never waits. Callers that would rather wait for a busy
//! lock than fail use [`acquire_with_retry`], which polls with exponential
//! backoff until a deadline.

use super::types::LockOptions;
use super::update::AtomicUpdate;
use crate::error::Result;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// How long and how often to retry a contended lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total time to keep retrying. Zero means a single attempt.
    pub timeout: Duration,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Cap for the exponentially growing delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A policy that gives up after the first contended attempt.
    pub fn fail_fast() -> Self {
        Self {
            timeout: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Retry for up to `timeout` with default delays.
    pub fn wait_for(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Backoff delay before retry number `attempt` (0-indexed).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }
}

/// Acquire the lock on `target`, retrying while it is contended.
///
/// Each attempt uses a fresh handle, since a failed handle is terminal.
/// Errors other than contention are returned immediately.
pub fn acquire_with_retry<P: AsRef<Path>>(
    target: P,
    options: &LockOptions,
    policy: &RetryPolicy,
) -> Result<AtomicUpdate> {
    let target = target.as_ref();
    let deadline = Instant::now() + policy.timeout;
    let mut attempt = 0;

    loop {
        let mut update = AtomicUpdate::new(target)?;
        match update.acquire(options) {
            Ok(()) => return Ok(update),
            Err(e) if e.is_contended() => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(e);
                }
                let delay = policy.backoff_delay(attempt).min(deadline - now);
                debug!(
                    target_file = %target.display(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "lock contended, retrying"
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
