//! Read-only lock inspection and manual clearing.
//!
//! Nothing here takes part in the protocol; it serves operators who need to
//! see who holds a lock or clear one left behind by a crashed process.

use super::marker;
use super::metadata::{LockMetadata, format_age};
use super::paths::UpdatePaths;
use super::types::MarkerKind;
use crate::error::{AtomupError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Information about an existing lock marker.
#[derive(Debug, Clone, Serialize)]
pub struct LockInfo {
    /// The lock marker path.
    pub lock_path: PathBuf,

    /// Whether the marker is a file or a directory.
    pub kind: MarkerKind,

    /// Time since the marker was created or last refreshed.
    #[serde(rename = "age_secs", serialize_with = "serialize_secs")]
    pub age: Duration,

    /// Whether the marker is older than the staleness threshold.
    pub is_stale: bool,

    /// Holder metadata, when the marker is a file written by atomup.
    pub metadata: Option<LockMetadata>,

    /// Whether a staging file exists next to the target.
    pub staging_present: bool,
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (age: {}", self.lock_path.display(), format_age(self.age))?;
        if let Some(meta) = &self.metadata {
            write!(f, ", owner: {}, pid: {}", meta.owner, meta.pid)?;
        }
        if self.is_stale {
            write!(f, ", STALE")?;
        }
        write!(f, ")")
    }
}

fn serialize_secs<S: serde::Serializer>(age: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(age.as_secs())
}

/// Describe the lock on `target`, or `None` when it is not locked.
pub fn inspect_lock<P: AsRef<Path>>(target: P, stale_after: Duration) -> Result<Option<LockInfo>> {
    let paths = UpdatePaths::derive(target)?;
    let lock_path = paths.lock();

    let Some(state) = marker::stat(lock_path).map_err(|source| AtomupError::LockIo {
        path: lock_path.to_path_buf(),
        source,
    })?
    else {
        return Ok(None);
    };

    let metadata = match state.kind {
        MarkerKind::File => LockMetadata::from_file(lock_path).ok(),
        MarkerKind::Directory => None,
    };

    Ok(Some(LockInfo {
        lock_path: lock_path.to_path_buf(),
        kind: state.kind,
        age: state.age,
        is_stale: state.age > stale_after,
        metadata,
        staging_present: paths.staging().exists(),
    }))
}

/// Remove the lock marker on `target`.
///
/// A stale marker is always removed. A fresh one is removed only with
/// `force`, since its holder may still be writing.
///
/// # Returns
///
/// * `Ok(LockInfo)` - The marker that was removed (for reporting)
/// * `Err(AtomupError::UserError)` - No lock exists, or it is fresh and `force` is unset
pub fn clear_lock<P: AsRef<Path>>(target: P, stale_after: Duration, force: bool) -> Result<LockInfo> {
    let target = target.as_ref();

    let Some(info) = inspect_lock(target, stale_after)? else {
        return Err(AtomupError::UserError(format!(
            "no lock exists for '{}'",
            target.display()
        )));
    };

    if !info.is_stale && !force {
        return Err(AtomupError::UserError(format!(
            "refusing to clear fresh lock {} without --force.\n\n\
             Clearing a live lock lets two writers update '{}' at once.\n\
             Only clear it if you are certain the holder has crashed.",
            info,
            target.display()
        )));
    }

    marker::remove(&info.lock_path).map_err(|source| AtomupError::LockIo {
        path: info.lock_path.clone(),
        source,
    })?;

    info!(
        lock = %info.lock_path.display(),
        stale = info.is_stale,
        force,
        "cleared lock"
    );
    Ok(info)
}
