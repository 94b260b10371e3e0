//! Filesystem primitives behind the lock marker.
//!
//! Exclusivity rests on operations that fail atomically when the name is
//! taken: `link(2)` onto the marker name, or `mkdir(2)` where links are
//! unavailable. A marker created either way occupies the same name, so the
//! two strategies also exclude each other.

use super::metadata::LockMetadata;
use super::paths::is_scratch_name;
use super::types::MarkerKind;
use std::ffi::OsStr;
use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Identifies one marker instance, so a re-created marker is not mistaken
/// for the one observed earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MarkerIdentity {
    dev: u64,
    ino: u64,
}

impl MarkerIdentity {
    #[cfg(unix)]
    pub(crate) fn of(meta: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    #[cfg(not(unix))]
    pub(crate) fn of(_meta: &Metadata) -> Option<Self> {
        None
    }

    /// True only when both identities are known and not equal.
    pub(crate) fn differs(a: Option<Self>, b: Option<Self>) -> bool {
        matches!((a, b), (Some(a), Some(b)) if a != b)
    }
}

/// Snapshot of an existing marker.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkerState {
    pub kind: MarkerKind,
    pub age: Duration,
    pub identity: Option<MarkerIdentity>,
}

/// Outcome of one claim attempt.
#[derive(Debug)]
pub(crate) enum Claim {
    Claimed(Option<MarkerIdentity>),
    Exists,
    /// The filesystem cannot create hard links.
    Unsupported,
}

/// Create `path` exclusively and write the holder's metadata into it.
pub(crate) fn write_token(path: &Path, metadata: &LockMetadata) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;

    let written = file
        .write_all(metadata.to_json_line().as_bytes())
        .and_then(|()| file.sync_all());
    if let Err(e) = written {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}

/// Link `token` to `marker`, then remove the token name whatever happened.
pub(crate) fn claim_by_link(token: &Path, marker: &Path) -> io::Result<Claim> {
    let linked = fs::hard_link(token, marker);

    let identity = match linked {
        Ok(()) => fs::metadata(token).ok().and_then(|m| MarkerIdentity::of(&m)),
        Err(_) => None,
    };

    if let Err(e) = fs::remove_file(token) {
        warn!(
            token = %token.display(),
            error = %e,
            "failed to remove lock token"
        );
    }

    match linked {
        Ok(()) => Ok(Claim::Claimed(identity)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(Claim::Exists),
        Err(e) if e.kind() == io::ErrorKind::Unsupported => Ok(Claim::Unsupported),
        Err(e) => Err(e),
    }
}

/// Create `marker` as a directory.
pub(crate) fn claim_by_dir(marker: &Path) -> io::Result<Claim> {
    match fs::create_dir(marker) {
        Ok(()) => {
            let identity = fs::symlink_metadata(marker)
                .ok()
                .and_then(|m| MarkerIdentity::of(&m));
            Ok(Claim::Claimed(identity))
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(Claim::Exists),
        Err(e) => Err(e),
    }
}

/// Inspect the marker, returning `None` when it does not exist.
pub(crate) fn stat(marker: &Path) -> io::Result<Option<MarkerState>> {
    let meta = match fs::symlink_metadata(marker) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let kind = if meta.is_dir() {
        MarkerKind::Directory
    } else {
        MarkerKind::File
    };

    Ok(Some(MarkerState {
        kind,
        age: age_of(meta.modified()?),
        identity: MarkerIdentity::of(&meta),
    }))
}

/// Time since `modified`; a timestamp in the future counts as brand new.
pub(crate) fn age_of(modified: SystemTime) -> Duration {
    SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO)
}

/// Remove the marker whichever kind it is. A missing marker is not an error.
pub(crate) fn remove(marker: &Path) -> io::Result<()> {
    let result = match fs::symlink_metadata(marker) {
        Ok(meta) if meta.is_dir() => fs::remove_dir(marker),
        Ok(_) => fs::remove_file(marker),
        Err(e) => Err(e),
    };

    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Set the marker's modification time.
pub(crate) fn set_modified(marker: &Path, when: SystemTime) -> io::Result<()> {
    let file = if fs::symlink_metadata(marker)?.is_dir() {
        File::open(marker)?
    } else {
        OpenOptions::new().write(true).open(marker)?
    };
    file.set_modified(when)
}

/// Delete leftover scratch tokens of `target_name` in `dir` that are older
/// than `older_than`. Returns how many were removed.
///
/// Only regular files whose name is an exact token name are considered.
pub(crate) fn sweep_scratch(dir: &Path, target_name: &OsStr, older_than: Duration) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping scratch sweep");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        if !is_scratch_name(target_name, &entry.file_name()) {
            continue;
        }

        // DirEntry::metadata does not follow symlinks.
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let Ok(modified) = meta.modified() else {
            continue;
        };
        if age_of(modified) <= older_than {
            continue;
        }

        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(token = %path.display(), "removed orphaned lock token");
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                token = %path.display(),
                error = %e,
                "failed to remove orphaned lock token"
            ),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn token_and_marker(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
        (
            dir.path().join("cache.TMP-test"),
            dir.path().join("cache.LCK"),
        )
    }

    #[test]
    fn test_link_claim_removes_token() {
        let dir = TempDir::new().unwrap();
        let (token, marker) = token_and_marker(&dir);

        write_token(&token, &LockMetadata::current()).unwrap();
        let claim = claim_by_link(&token, &marker).unwrap();

        assert!(matches!(claim, Claim::Claimed(_)));
        assert!(marker.exists());
        assert!(!token.exists());
        assert_eq!(
            LockMetadata::from_file(&marker).unwrap().pid,
            std::process::id()
        );
    }

    #[test]
    fn test_link_claim_reports_existing_marker() {
        let dir = TempDir::new().unwrap();
        let (token, marker) = token_and_marker(&dir);
        fs::write(&marker, "held").unwrap();

        write_token(&token, &LockMetadata::current()).unwrap();
        let claim = claim_by_link(&token, &marker).unwrap();

        assert!(matches!(claim, Claim::Exists));
        assert!(!token.exists());
        assert_eq!(fs::read_to_string(&marker).unwrap(), "held");
    }

    #[test]
    fn test_write_token_refuses_existing_name() {
        let dir = TempDir::new().unwrap();
        let (token, _) = token_and_marker(&dir);
        fs::write(&token, "someone else").unwrap();

        let err = write_token(&token, &LockMetadata::current()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&token).unwrap(), "someone else");
    }

    #[test]
    fn test_dir_claim_excludes_file_marker() {
        let dir = TempDir::new().unwrap();
        let (_, marker) = token_and_marker(&dir);
        fs::write(&marker, "held").unwrap();

        assert!(matches!(claim_by_dir(&marker).unwrap(), Claim::Exists));
    }

    #[test]
    fn test_link_claim_excludes_dir_marker() {
        let dir = TempDir::new().unwrap();
        let (token, marker) = token_and_marker(&dir);
        assert!(matches!(claim_by_dir(&marker).unwrap(), Claim::Claimed(_)));

        write_token(&token, &LockMetadata::current()).unwrap();
        assert!(matches!(
            claim_by_link(&token, &marker).unwrap(),
            Claim::Exists
        ));
    }

    #[test]
    fn test_stat_and_remove_both_kinds() {
        let dir = TempDir::new().unwrap();
        let (_, marker) = token_and_marker(&dir);

        assert!(stat(&marker).unwrap().is_none());

        fs::write(&marker, "").unwrap();
        assert_eq!(stat(&marker).unwrap().unwrap().kind, MarkerKind::File);
        remove(&marker).unwrap();
        assert!(!marker.exists());

        fs::create_dir(&marker).unwrap();
        assert_eq!(stat(&marker).unwrap().unwrap().kind, MarkerKind::Directory);
        remove(&marker).unwrap();
        assert!(!marker.exists());

        // Removing a missing marker is fine.
        remove(&marker).unwrap();
    }

    #[test]
    fn test_set_modified_changes_age() {
        let dir = TempDir::new().unwrap();
        let (_, marker) = token_and_marker(&dir);
        fs::write(&marker, "").unwrap();

        let hour_ago = SystemTime::now() - Duration::from_secs(3600);
        set_modified(&marker, hour_ago).unwrap();

        let age = stat(&marker).unwrap().unwrap().age;
        assert!(age >= Duration::from_secs(3590));
    }

    #[test]
    fn test_future_mtime_counts_as_fresh() {
        let future = SystemTime::now() + Duration::from_secs(3600);
        assert_eq!(age_of(future), Duration::ZERO);
    }

    #[cfg(unix)]
    #[test]
    fn test_identity_tracks_recreation() {
        let dir = TempDir::new().unwrap();
        let (_, marker) = token_and_marker(&dir);

        fs::write(&marker, "first").unwrap();
        let first = stat(&marker).unwrap().unwrap().identity;
        // Keep the first inode alive so the second cannot reuse its number.
        let keep = dir.path().join("keep");
        fs::hard_link(&marker, &keep).unwrap();
        fs::remove_file(&marker).unwrap();
        fs::write(&marker, "second").unwrap();
        let second = stat(&marker).unwrap().unwrap().identity;

        assert!(MarkerIdentity::differs(first, second));
        assert!(!MarkerIdentity::differs(first, first));
        assert!(!MarkerIdentity::differs(first, None));
    }

    #[test]
    fn test_sweep_removes_only_old_matching_tokens() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("cache.TMP-1-a0-0");
        let fresh = dir.path().join("cache.TMP-2-b0-1");
        let other = dir.path().join("other.TMP-3-c0-2");
        let user_file = dir.path().join("cache.TMP-old");
        let token_like_dir = dir.path().join("cache.TMP-4-d0-3");
        for path in [&old, &fresh, &other, &user_file] {
            fs::write(path, "").unwrap();
        }
        fs::create_dir(&token_like_dir).unwrap();
        let long_ago = SystemTime::now() - Duration::from_secs(7200);
        for path in [&old, &other, &user_file, &token_like_dir] {
            set_modified(path, long_ago).unwrap();
        }

        let removed = sweep_scratch(
            dir.path(),
            OsStr::new("cache"),
            Duration::from_secs(600),
        );

        assert_eq!(removed, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(other.exists());
        assert!(user_file.exists());
        assert!(token_like_dir.is_dir());
    }
}
