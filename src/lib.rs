//! Atomup: atomic updates of shared files, coordinated by lock files.
//!
//! The [`locks`] module implements the protocol: derive the sibling paths of
//! a target, take an exclusive lock marker, stage the new content, then
//! commit it with an atomic rename or abandon it. Locks left by crashed
//! processes are reclaimed once they are older than a caller-supplied
//! threshold.
//!
//! ```no_run
//! use atomup::locks::{AtomicUpdate, LockOptions};
//!
//! # fn main() -> atomup::error::Result<()> {
//! let mut update = AtomicUpdate::new("/var/cache/fonts.cache")?;
//! update.acquire(&LockOptions::default())?;
//! update.write_staged(b"new content")?;
//! update.commit()?;
//! update.release();
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod locks;
pub mod telemetry;
