//! Exit code constants for the atomup CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config, misuse of the update handle)
//! - 2: Commit failure (staged content preserved)
//! - 3: Filesystem failure while locking or staging
//! - 4: Lock is held by another process

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration or invalid target path.
pub const USER_ERROR: i32 = 1;

/// The staged replacement could not be renamed onto the target.
pub const COMMIT_FAILURE: i32 = 2;

/// Filesystem error during lock acquisition, staging or release.
pub const IO_FAILURE: i32 = 3;

/// The lock is held by another process and is not stale.
pub const LOCK_CONTENDED: i32 = 4;
