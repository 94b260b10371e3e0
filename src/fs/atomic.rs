//! Durable writes and atomic replacement.
//!
//! The update protocol never writes into the live file. Content is written to
//! a sibling path, optionally synced to disk, and then renamed over the live
//! file in one step.
//!
//! # Cross-Platform Behavior
//!
//! - **POSIX (Linux, macOS)**: `rename()` is atomic when source and
//!   destination are on the same filesystem and replaces an existing target.
//! - **Windows**: `std::fs::rename` uses `MoveFileExW` with
//!   `MOVEFILE_REPLACE_EXISTING`, so an existing target is replaced as well.
//!
//! # Important Notes
//!
//! - Source and destination must live on the same filesystem/volume. A
//!   cross-device rename fails and is reported; it is never emulated with a
//!   copy, since a copy would expose a partially written target.
//! - On failure the source is left untouched so the caller can retry.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Write `content` to `path`, truncating any previous content.
///
/// When `sync` is set the file is flushed to stable storage before returning.
pub fn write_and_sync(path: &Path, content: &[u8], sync: bool) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    if sync {
        file.sync_all()?;
    }
    Ok(())
}

/// Atomically replace `target` with `source`.
///
/// When `sync_dir` is set, the parent directory is synced afterwards so the
/// new directory entry survives a crash. Directory sync failures are ignored:
/// the rename itself already happened.
pub fn replace_file(source: &Path, target: &Path, sync_dir: bool) -> io::Result<()> {
    fs::rename(source, target)?;

    if sync_dir {
        sync_parent(target);
    }

    Ok(())
}

#[cfg(unix)]
fn sync_parent(path: &Path) {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
}

// Directories cannot be opened as files without extra flags on Windows.
#[cfg(not(unix))]
fn sync_parent(_path: &Path) {}
