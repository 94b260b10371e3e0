//! Config struct definition and default implementation.

use super::types::*;
use crate::locks::LockStrategy;
use serde::{Deserialize, Serialize};

/// Configuration for the atomup CLI.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Seconds after which an untouched lock marker is considered abandoned.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,

    /// How many stale markers one acquire may remove before giving up.
    #[serde(default = "default_max_reclaim_attempts")]
    pub max_reclaim_attempts: u32,

    /// How the marker is created.
    #[serde(default)]
    pub lock_strategy: LockStrategy,

    // =========================================================================
    // Waiting
    // =========================================================================
    /// How long `replace` keeps retrying a busy lock (0 fails immediately).
    #[serde(default)]
    pub wait_timeout_ms: u64,

    /// Delay after the first contended attempt.
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    /// Upper bound for the doubling retry delay.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    // =========================================================================
    // Durability
    // =========================================================================
    /// Whether staged content and the parent directory are fsynced.
    #[serde(default = "default_true")]
    pub sync_on_commit: bool,

    // =========================================================================
    // Logging
    // =========================================================================
    /// `tracing` filter directive, overridden by `RUST_LOG` when set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Log line format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
            max_reclaim_attempts: default_max_reclaim_attempts(),
            lock_strategy: LockStrategy::default(),
            wait_timeout_ms: 0,
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            sync_on_commit: default_true(),
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
        }
    }
}
