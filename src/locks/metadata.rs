//! Diagnostic metadata written into the scratch token.
//!
//! The token becomes the lock marker once linked, so operators can see who
//! holds a lock. The protocol itself never reads it back: exclusivity comes
//! from the link, staleness from the marker's mtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Lock metadata stored in hard-link lock markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMetadata {
    /// Owner of the lock (e.g., `user@HOST`).
    pub owner: String,

    /// Process ID of the lock holder.
    pub pid: u32,

    /// Timestamp when the token was written (RFC3339).
    pub created_at: DateTime<Utc>,
}

impl LockMetadata {
    /// Metadata describing the current process.
    pub fn current() -> Self {
        Self {
            owner: get_owner_string(),
            pid: std::process::id(),
            created_at: Utc::now(),
        }
    }

    /// Parse lock metadata from a marker file.
    ///
    /// Fails for directory markers and for markers written by other tools.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Serialize to a single JSON line.
    pub fn to_json_line(&self) -> String {
        // Three plain fields; serialization cannot fail.
        let mut line = serde_json::to_string(self).unwrap_or_default();
        line.push('\n');
        line
    }
}

/// Format an age as a short human-readable string.
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    let minutes = secs / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

/// Get the owner string for lock metadata.
pub(crate) fn get_owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}
