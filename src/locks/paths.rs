//! Path derivation for atomic updates.
//!
//! Every protected file has three fixed siblings plus one per-attempt token:
//!
//! | Path | Purpose |
//! |---|---|
//! | `<target>` | live resource, visible to all readers |
//! | `<target>.NEW` | staged replacement content |
//! | `<target>.LCK` | exclusivity marker |
//! | `<target>.TMP-<unique>` | acquisition race token |

use crate::error::{AtomupError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Suffix of the staging file.
pub const STAGING_SUFFIX: &str = ".NEW";

/// Suffix of the lock marker.
pub const LOCK_SUFFIX: &str = ".LCK";

/// Prefix of the scratch token suffix; a unique part follows it.
pub const SCRATCH_SUFFIX: &str = ".TMP-";

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The four paths used to update one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePaths {
    target: PathBuf,
    staging: PathBuf,
    lock: PathBuf,
    scratch: PathBuf,
}

impl UpdatePaths {
    /// Derive the update paths for `target`.
    ///
    /// Performs no I/O. Fails only for paths that have no file name to
    /// append suffixes to (empty, root, `.` or `..`).
    pub fn derive<P: AsRef<Path>>(target: P) -> Result<Self> {
        let target = target.as_ref();

        if target.as_os_str().is_empty() {
            return Err(AtomupError::InvalidPath {
                path: target.to_path_buf(),
                reason: "path is empty",
            });
        }
        let Some(file_name) = target.file_name() else {
            return Err(AtomupError::InvalidPath {
                path: target.to_path_buf(),
                reason: "path does not name a file",
            });
        };

        // Rebuild from the components so a trailing separator cannot leak
        // into the suffixed names.
        let target = match target.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        };

        let paths = Self {
            staging: with_suffix(&target, STAGING_SUFFIX),
            lock: with_suffix(&target, LOCK_SUFFIX),
            scratch: scratch_path(&target),
            target,
        };
        paths.check_distinct()?;
        Ok(paths)
    }

    /// The live resource.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Where the replacement content is staged until commit.
    pub fn staging(&self) -> &Path {
        &self.staging
    }

    /// The exclusivity marker.
    pub fn lock(&self) -> &Path {
        &self.lock
    }

    /// The per-attempt race token.
    pub fn scratch(&self) -> &Path {
        &self.scratch
    }

    /// File name of the target, which every scratch token name starts with.
    pub(crate) fn target_name(&self) -> &OsStr {
        self.target.file_name().unwrap_or_default()
    }

    /// Pick a new unique scratch name after a name collision.
    pub(crate) fn renew_scratch(&mut self) {
        self.scratch = scratch_path(&self.target);
    }

    fn check_distinct(&self) -> Result<()> {
        let all = [&self.target, &self.staging, &self.lock, &self.scratch];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                if a == b {
                    return Err(AtomupError::CorruptState(format!(
                        "derived path '{}' collides with another update path",
                        a.display()
                    )));
                }
            }
        }
        Ok(())
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Whether `candidate` is a scratch token name for `target_name`.
///
/// Only the exact `<target>.TMP-<pid>-<hex nanos>-<counter>` form produced by
/// [`UpdatePaths::derive`] matches, so unrelated files that happen to share
/// the prefix are never taken for tokens.
pub(crate) fn is_scratch_name(target_name: &OsStr, candidate: &OsStr) -> bool {
    let Some(rest) = candidate
        .as_encoded_bytes()
        .strip_prefix(target_name.as_encoded_bytes())
        .and_then(|rest| rest.strip_prefix(SCRATCH_SUFFIX.as_bytes()))
    else {
        return false;
    };

    let mut parts = rest.split(|&b| b == b'-');
    let (Some(pid), Some(nanos), Some(counter), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let decimal = |part: &[u8]| !part.is_empty() && part.iter().all(u8::is_ascii_digit);
    decimal(pid) && decimal(counter) && !nanos.is_empty() && nanos.iter().all(u8::is_ascii_hexdigit)
}

/// Process id, wall clock nanos and a process-local counter.
fn scratch_path(target: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let counter = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);

    with_suffix(
        target,
        &format!(
            "{}{}-{:x}-{}",
            SCRATCH_SUFFIX,
            std::process::id(),
            nanos,
            counter
        ),
    )
}
