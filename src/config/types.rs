//! Configuration types and defaults.

use serde::{Deserialize, Serialize};

/// Output format for log lines written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Single-line human readable output (default).
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

// Default value functions for serde
pub(crate) fn default_stale_after_secs() -> u64 {
    600
}
pub(crate) fn default_max_reclaim_attempts() -> u32 {
    3
}
pub(crate) fn default_retry_initial_delay_ms() -> u64 {
    50
}
pub(crate) fn default_retry_max_delay_ms() -> u64 {
    1000
}
pub(crate) fn default_log_filter() -> String {
    "warn".to_string()
}
pub(crate) fn default_true() -> bool {
    true
}
