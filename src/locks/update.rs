//! The update handle: acquire, stage, commit or abandon, release.

use super::marker::{self, Claim, MarkerIdentity};
use super::metadata::LockMetadata;
use super::paths::UpdatePaths;
use super::types::{LockOptions, LockStrategy, MarkerKind, UpdateState};
use crate::error::{AtomupError, Result};
use crate::fs::{replace_file, write_and_sync};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Scratch-name collisions tolerated before giving up on a token.
const MAX_TOKEN_COLLISIONS: u32 = 3;

/// One update of one target file.
///
/// Construct with [`AtomicUpdate::new`], then `acquire`, write the
/// replacement with `write_staged`, then `commit` or `abandon`, then
/// `release`. A handle dropped while it still holds the lock abandons the
/// staged content and releases the lock.
#[derive(Debug)]
pub struct AtomicUpdate {
    paths: UpdatePaths,
    state: UpdateState,
    held: Option<HeldMarker>,
    sync: bool,
}

#[derive(Debug, Clone, Copy)]
struct HeldMarker {
    kind: MarkerKind,
    identity: Option<MarkerIdentity>,
}

impl AtomicUpdate {
    /// Derive the update paths for `target`. No I/O is performed.
    pub fn new<P: AsRef<Path>>(target: P) -> Result<Self> {
        Ok(Self {
            paths: UpdatePaths::derive(target)?,
            state: UpdateState::Unlocked,
            held: None,
            sync: true,
        })
    }

    pub fn paths(&self) -> &UpdatePaths {
        &self.paths
    }

    pub fn target_path(&self) -> &Path {
        self.paths.target()
    }

    pub fn staging_path(&self) -> &Path {
        self.paths.staging()
    }

    pub fn lock_path(&self) -> &Path {
        self.paths.lock()
    }

    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// Kind of marker this handle created, while it holds the lock.
    pub fn marker_kind(&self) -> Option<MarkerKind> {
        self.held.map(|h| h.kind)
    }

    /// Try to take the exclusive update lock.
    ///
    /// Never waits for another holder. A fresh marker yields
    /// [`AtomupError::LockContended`]; a marker older than
    /// `options.stale_after` is removed and the claim retried, at most
    /// `options.max_reclaims` times. On success any leftover staging file is
    /// deleted. Any failure leaves the handle in [`UpdateState::Failed`].
    pub fn acquire(&mut self, options: &LockOptions) -> Result<()> {
        if self.state != UpdateState::Unlocked {
            return Err(self.invalid("acquire"));
        }

        self.sync = options.sync;
        self.state = UpdateState::Acquiring;
        match self.acquire_loop(options) {
            Ok(held) => {
                self.held = Some(held);
                self.state = UpdateState::Locked;
                self.clear_leftovers(options);
                info!(lock = %self.lock_path().display(), "acquired update lock");
                Ok(())
            }
            Err(e) => {
                self.state = UpdateState::Failed;
                Err(e)
            }
        }
    }

    fn acquire_loop(&mut self, options: &LockOptions) -> Result<HeldMarker> {
        let lock_path = self.paths.lock().to_path_buf();
        let mut kind = options.strategy.marker_kind();
        let mut reclaims = 0;

        loop {
            let claim = match kind {
                MarkerKind::File => match self.claim_by_link() {
                    Err(AtomupError::LockIo { source, .. })
                        if link_refused(options.strategy, source.kind()) =>
                    {
                        Claim::Unsupported
                    }
                    claim => claim?,
                },
                MarkerKind::Directory => {
                    marker::claim_by_dir(&lock_path).map_err(|source| AtomupError::LockIo {
                        path: lock_path.clone(),
                        source,
                    })?
                }
            };

            match claim {
                Claim::Claimed(identity) => return Ok(HeldMarker { kind, identity }),
                Claim::Unsupported => {
                    debug!(
                        lock = %lock_path.display(),
                        "hard links unsupported, falling back to directory marker"
                    );
                    kind = MarkerKind::Directory;
                    continue;
                }
                Claim::Exists => {}
            }

            let existing = marker::stat(&lock_path).map_err(|source| AtomupError::LockIo {
                path: lock_path.clone(),
                source,
            })?;

            let Some(existing) = existing else {
                // Released between our claim and the stat; try again.
                if reclaims >= options.max_reclaims {
                    return Err(contended(&lock_path, std::time::Duration::ZERO));
                }
                reclaims += 1;
                continue;
            };

            if existing.age <= options.stale_after {
                debug!(
                    lock = %lock_path.display(),
                    age_secs = existing.age.as_secs(),
                    "lock held by another process"
                );
                return Err(contended(&lock_path, existing.age));
            }

            if reclaims >= options.max_reclaims {
                warn!(
                    lock = %lock_path.display(),
                    reclaims,
                    "giving up after repeated stale lock reclaims"
                );
                return Err(contended(&lock_path, existing.age));
            }
            reclaims += 1;

            warn!(
                lock = %lock_path.display(),
                age_secs = existing.age.as_secs(),
                threshold_secs = options.stale_after.as_secs(),
                "reclaiming stale lock"
            );
            self.reclaim(&lock_path, existing.identity, options)?;
        }
    }

    /// Write a fresh token and link it to the marker name.
    fn claim_by_link(&mut self) -> Result<Claim> {
        let metadata = LockMetadata::current();
        let mut collisions = 0;

        loop {
            let token = self.paths.scratch().to_path_buf();
            match marker::write_token(&token, &metadata) {
                Ok(()) => {
                    return marker::claim_by_link(&token, self.paths.lock()).map_err(|source| {
                        AtomupError::LockIo {
                            path: self.paths.lock().to_path_buf(),
                            source,
                        }
                    });
                }
                Err(e)
                    if e.kind() == io::ErrorKind::AlreadyExists
                        && collisions < MAX_TOKEN_COLLISIONS =>
                {
                    collisions += 1;
                    self.paths.renew_scratch();
                }
                Err(source) => return Err(AtomupError::LockIo { path: token, source }),
            }
        }
    }

    /// Remove a stale marker if it is still the one observed and still stale.
    fn reclaim(
        &self,
        lock_path: &Path,
        observed: Option<MarkerIdentity>,
        options: &LockOptions,
    ) -> Result<()> {
        let io_err = |source| AtomupError::LockIo {
            path: lock_path.to_path_buf(),
            source,
        };

        let Some(current) = marker::stat(lock_path).map_err(io_err)? else {
            return Ok(());
        };
        if MarkerIdentity::differs(observed, current.identity)
            || current.age <= options.stale_after
        {
            debug!(lock = %lock_path.display(), "stale lock replaced before reclaim");
            return Ok(());
        }

        marker::remove(lock_path).map_err(io_err)
    }

    /// Best-effort cleanup once the lock is held.
    fn clear_leftovers(&self, options: &LockOptions) {
        let staging = self.paths.staging();
        match fs::remove_file(staging) {
            Ok(()) => debug!(
                staging = %staging.display(),
                "removed leftover staging file"
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                staging = %staging.display(),
                error = %e,
                "failed to remove leftover staging file"
            ),
        }

        let dir = parent_dir(self.paths.target());
        marker::sweep_scratch(&dir, self.paths.target_name(), options.stale_after);
    }

    /// Write the complete replacement content to the staging file.
    pub fn write_staged(&mut self, content: &[u8]) -> Result<()> {
        if self.state != UpdateState::Locked {
            return Err(self.invalid("stage content for"));
        }

        write_and_sync(self.paths.staging(), content, self.sync).map_err(|source| {
            AtomupError::StagingIo {
                path: self.paths.staging().to_path_buf(),
                source,
            }
        })
    }

    /// Rename the staging file onto the target.
    ///
    /// Readers of the target see either the old or the new content. On
    /// failure the staging file is left in place and the handle stays
    /// locked, so the caller may retry or abandon.
    pub fn commit(&mut self) -> Result<()> {
        if self.state != UpdateState::Locked {
            return Err(self.invalid("commit"));
        }

        replace_file(self.paths.staging(), self.paths.target(), self.sync).map_err(|source| {
            AtomupError::CommitIo {
                staging: self.paths.staging().to_path_buf(),
                target: self.paths.target().to_path_buf(),
                source,
            }
        })?;

        self.state = UpdateState::Committed;
        info!(target_file = %self.target_path().display(), "committed update");
        Ok(())
    }

    /// Discard the staged content. Never fails.
    ///
    /// Does nothing unless this handle holds the lock, since the staging
    /// file otherwise belongs to whoever does.
    pub fn abandon(&mut self) {
        match self.state {
            UpdateState::Locked => {}
            UpdateState::Abandoned => return,
            state => {
                debug!(%state, "abandon ignored, lock not held");
                return;
            }
        }

        let staging = self.paths.staging();
        match fs::remove_file(staging) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                staging = %staging.display(),
                error = %e,
                "failed to remove staging file"
            ),
        }
        self.state = UpdateState::Abandoned;
    }

    /// Remove the lock marker. Never fails and is idempotent.
    ///
    /// Releasing straight from `Locked` abandons the staged content first. A
    /// marker that no longer is the one this handle created (reclaimed as
    /// stale and re-taken by another process) is left alone.
    pub fn release(&mut self) {
        if self.state == UpdateState::Locked {
            self.abandon();
        }

        let Some(held) = self.held.take() else {
            debug!(state = %self.state, "release ignored, lock not held");
            return;
        };
        self.state = UpdateState::Released;

        let lock_path = self.paths.lock();
        match marker::stat(lock_path) {
            Ok(None) => {
                warn!(lock = %lock_path.display(), "lock marker already gone");
                return;
            }
            Ok(Some(current)) if MarkerIdentity::differs(held.identity, current.identity) => {
                warn!(
                    lock = %lock_path.display(),
                    "lock was reclaimed by another process, leaving it in place"
                );
                return;
            }
            Ok(Some(_)) => {}
            Err(e) => debug!(lock = %lock_path.display(), error = %e, "could not stat lock marker"),
        }

        match marker::remove(lock_path) {
            Ok(()) => info!(lock = %lock_path.display(), "released update lock"),
            Err(e) => warn!(
                lock = %lock_path.display(),
                error = %e,
                "failed to release lock, it will be reclaimed once stale"
            ),
        }
    }

    /// Bump the marker's mtime so a long-running holder is not judged stale.
    pub fn refresh(&self) -> Result<()> {
        if !self.state.holds_lock() {
            return Err(self.invalid("refresh"));
        }

        marker::set_modified(self.paths.lock(), SystemTime::now()).map_err(|source| {
            AtomupError::LockIo {
                path: self.paths.lock().to_path_buf(),
                source,
            }
        })
    }

    fn invalid(&self, operation: &'static str) -> AtomupError {
        AtomupError::InvalidTransition {
            state: self.state,
            operation,
        }
    }
}

impl Drop for AtomicUpdate {
    fn drop(&mut self) {
        if self.held.is_some() {
            if self.state == UpdateState::Locked {
                warn!(
                    lock = %self.lock_path().display(),
                    "update dropped while locked, abandoning staged content"
                );
            }
            self.release();
        }
    }
}

/// Acquire, stage `content`, commit and release in one call.
///
/// The lock is released on every path; a failed commit abandons the staged
/// content before releasing.
pub fn replace_locked<P: AsRef<Path>>(
    target: P,
    content: &[u8],
    options: &LockOptions,
) -> Result<()> {
    let mut update = AtomicUpdate::new(target)?;
    update.acquire(options)?;

    let result = update
        .write_staged(content)
        .and_then(|()| update.commit());
    if result.is_err() {
        update.abandon();
    }
    update.release();
    result
}

fn contended(lock_path: &Path, age: std::time::Duration) -> AtomupError {
    AtomupError::LockContended {
        lock_path: lock_path.to_path_buf(),
        age,
    }
}

/// Whether a failed link under `strategy` should fall back to a directory.
///
/// Filesystems without hard links report EPERM on Linux rather than
/// `Unsupported`. Only `Auto` treats that as a cue; an explicit `HardLink`
/// strategy surfaces the error.
fn link_refused(strategy: LockStrategy, kind: io::ErrorKind) -> bool {
    strategy == LockStrategy::Auto && kind == io::ErrorKind::PermissionDenied
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
