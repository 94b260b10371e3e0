//! Filesystem helpers for atomup.
//!
//! Durable writes and atomic renames used by the update protocol.

pub mod atomic;

pub use atomic::{replace_file, write_and_sync};
