//! Error types for atomup.
//!
//! Uses thiserror for derive macros. Lock contention is reported as its own
//! variant since it is an expected outcome rather than a fault.

use crate::exit_codes;
use crate::locks::UpdateState;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for atomup operations.
#[derive(Error, Debug)]
pub enum AtomupError {
    /// Invalid arguments or configuration.
    #[error("{0}")]
    UserError(String),

    /// The target path cannot be protected by a lock.
    #[error("invalid target path '{}': {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: &'static str },

    /// The lock marker exists and is younger than the staleness threshold.
    #[error(
        "lock '{}' is held by another process (age {}s)",
        lock_path.display(),
        age.as_secs()
    )]
    LockContended { lock_path: PathBuf, age: Duration },

    /// Creating the scratch token, claiming or reclaiming the lock failed.
    #[error("lock operation failed on '{}': {source}", path.display())]
    LockIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Renaming the staging file onto the target failed.
    #[error(
        "failed to commit '{}' onto '{}': {source}",
        staging.display(),
        target.display()
    )]
    CommitIo {
        staging: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the staging file failed.
    #[error("failed to write staging file '{}': {source}", path.display())]
    StagingIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Derived paths collide with each other.
    #[error("corrupt update state: {0}")]
    CorruptState(String),

    /// An operation was invoked in a state that does not allow it.
    #[error("cannot {operation} an update in state '{state}'")]
    InvalidTransition {
        state: UpdateState,
        operation: &'static str,
    },
}

impl AtomupError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            AtomupError::UserError(_) => exit_codes::USER_ERROR,
            AtomupError::InvalidPath { .. } => exit_codes::USER_ERROR,
            AtomupError::InvalidTransition { .. } => exit_codes::USER_ERROR,
            AtomupError::LockContended { .. } => exit_codes::LOCK_CONTENDED,
            AtomupError::LockIo { .. } => exit_codes::IO_FAILURE,
            AtomupError::StagingIo { .. } => exit_codes::IO_FAILURE,
            AtomupError::CorruptState(_) => exit_codes::IO_FAILURE,
            AtomupError::CommitIo { .. } => exit_codes::COMMIT_FAILURE,
        }
    }

    /// Whether this error only means another process currently holds the lock.
    pub fn is_contended(&self) -> bool {
        matches!(self, AtomupError::LockContended { .. })
    }
}

/// Result type alias for atomup operations.
pub type Result<T> = std::result::Result<T, AtomupError>;
