//! Lock options, strategies and the update state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Age after which an abandoned lock marker may be reclaimed.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(10 * 60);

/// Stale-lock reclaims attempted by a single `acquire` before giving up.
pub const DEFAULT_MAX_RECLAIMS: u32 = 3;

/// Filesystem primitive used to claim the lock marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockStrategy {
    /// Hard links on Unix, directory creation elsewhere.
    ///
    /// Falls back to a directory marker when the filesystem refuses the
    /// link, either as `Unsupported` or, as vfat and some FUSE mounts do on
    /// Linux, with EPERM.
    #[default]
    Auto,
    /// Link a uniquely named token file to the marker name.
    HardLink,
    /// Create the marker as a directory.
    Directory,
}

impl LockStrategy {
    /// The marker kind this strategy creates on the current platform.
    pub fn marker_kind(self) -> MarkerKind {
        match self {
            LockStrategy::HardLink => MarkerKind::File,
            LockStrategy::Directory => MarkerKind::Directory,
            LockStrategy::Auto if cfg!(unix) => MarkerKind::File,
            LockStrategy::Auto => MarkerKind::Directory,
        }
    }
}

/// What a lock marker is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// A regular file, created by hard-linking a token.
    File,
    /// A directory, created exclusively.
    Directory,
}

/// Caller-supplied parameters for `acquire`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Markers older than this are treated as abandoned.
    pub stale_after: Duration,

    /// Upper bound on stale-marker reclaims within one `acquire`.
    pub max_reclaims: u32,

    /// How the marker is claimed.
    pub strategy: LockStrategy,

    /// Whether staged content and directory entries are synced to disk.
    pub sync: bool,
}

impl LockOptions {
    /// Options with the given staleness threshold and defaults otherwise.
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, strategy: LockStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_reclaims(mut self, max_reclaims: u32) -> Self {
        self.max_reclaims = max_reclaims;
        self
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            max_reclaims: DEFAULT_MAX_RECLAIMS,
            strategy: LockStrategy::Auto,
            sync: true,
        }
    }
}

/// Lifecycle of an [`AtomicUpdate`](super::AtomicUpdate).
///
/// ```text
/// Unlocked -> Acquiring -> Locked | Failed
/// Locked -> Committed | Abandoned -> Released
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Unlocked,
    Acquiring,
    Locked,
    Failed,
    Committed,
    Abandoned,
    Released,
}

impl UpdateState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateState::Unlocked => "unlocked",
            UpdateState::Acquiring => "acquiring",
            UpdateState::Locked => "locked",
            UpdateState::Failed => "failed",
            UpdateState::Committed => "committed",
            UpdateState::Abandoned => "abandoned",
            UpdateState::Released => "released",
        }
    }

    /// Whether the lock marker belongs to this handle in this state.
    pub fn holds_lock(&self) -> bool {
        matches!(
            self,
            UpdateState::Locked | UpdateState::Committed | UpdateState::Abandoned
        )
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
