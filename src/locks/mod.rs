//! Lock-file protocol for atomic updates of shared files.
//!
//! A cache or configuration file read by unrelated processes is rewritten
//! using plain filesystem operations only: no advisory locks, no daemon.
//!
//! # Files
//!
//! For a target `cache`:
//! - `cache.LCK`: exclusivity marker, present while an update is in progress
//! - `cache.NEW`: the complete replacement, written by the lock holder
//! - `cache.TMP-<unique>`: race token, exists only during acquisition
//!
//! # Protocol
//!
//! 1. Write the holder's metadata to a uniquely named token.
//! 2. Hard-link the token to `cache.LCK`. The link fails if the marker exists,
//!    which is what makes the claim atomic. Where links are unavailable the
//!    marker is created as a directory instead.
//! 3. Remove the token name whether or not the link succeeded.
//! 4. A marker older than the staleness threshold is considered abandoned,
//!    removed and the claim retried a bounded number of times.
//! 5. The holder writes `cache.NEW`, then renames it over `cache` (commit) or
//!    deletes it (abandon), and finally removes the marker (release).
//!
//! Readers that know nothing about the protocol only ever observe the old or
//! the new content, because the rename is atomic.
//!
//! # Staleness
//!
//! Staleness is judged by the marker's mtime. A holder whose work may outlast
//! the threshold keeps the marker fresh with [`AtomicUpdate::refresh`].
//!
//! # RAII
//!
//! An [`AtomicUpdate`] dropped while holding the lock abandons its staged
//! content and releases the marker. Failures during that cleanup are logged,
//! not raised.

mod inspect;
mod marker;
mod metadata;
mod paths;
mod retry;
mod types;
mod update;


// Re-export public API
pub use inspect::{LockInfo, clear_lock, inspect_lock};
pub use metadata::{LockMetadata, format_age};
pub use paths::{LOCK_SUFFIX, SCRATCH_SUFFIX, STAGING_SUFFIX, UpdatePaths};
pub use retry::{RetryPolicy, acquire_with_retry};
pub use types::{
    DEFAULT_MAX_RECLAIMS, DEFAULT_STALE_AFTER, LockOptions, LockStrategy, MarkerKind, UpdateState,
};
pub use update::{AtomicUpdate, replace_locked};
