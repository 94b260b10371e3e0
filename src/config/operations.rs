//! Config loading, validation, and conversion into library types.

use super::model::Config;
use crate::error::{AtomupError, Result};
use crate::locks::{LockOptions, RetryPolicy};
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(AtomupError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            AtomupError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| AtomupError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `stale_after_secs` must be positive
    /// - `max_reclaim_attempts` must be positive
    /// - `retry_initial_delay_ms` must not exceed `retry_max_delay_ms`
    /// - `log_filter` must not be blank
    pub fn validate(&self) -> Result<()> {
        if self.stale_after_secs == 0 {
            return Err(invalid("stale_after_secs must be greater than 0"));
        }

        if self.max_reclaim_attempts == 0 {
            return Err(invalid("max_reclaim_attempts must be greater than 0"));
        }

        if self.retry_initial_delay_ms > self.retry_max_delay_ms {
            return Err(AtomupError::UserError(format!(
                "config validation failed: retry_initial_delay_ms ({}) must not exceed retry_max_delay_ms ({})",
                self.retry_initial_delay_ms, self.retry_max_delay_ms
            )));
        }

        if self.log_filter.trim().is_empty() {
            return Err(invalid("log_filter must not be empty"));
        }

        Ok(())
    }

    /// Staleness threshold as a `Duration`.
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    /// Options for [`AtomicUpdate::acquire`](crate::locks::AtomicUpdate::acquire).
    pub fn lock_options(&self) -> LockOptions {
        LockOptions::new(self.stale_after())
            .with_max_reclaims(self.max_reclaim_attempts)
            .with_strategy(self.lock_strategy)
            .with_sync(self.sync_on_commit)
    }

    /// Retry policy for [`acquire_with_retry`](crate::locks::acquire_with_retry).
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(self.wait_timeout_ms),
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }
}

fn invalid(rule: &str) -> AtomupError {
    AtomupError::UserError(format!("config validation failed: {}", rule))
}
