//! Implementation of the `atomup status` command.

use super::stale_after;
use crate::cli::StatusArgs;
use crate::config::Config;
use crate::error::{AtomupError, Result};
use crate::locks::{MarkerKind, format_age, inspect_lock};
use serde_json::json;

pub fn cmd_status(args: StatusArgs, config: &Config) -> Result<()> {
    let threshold = stale_after(args.stale_after, config)?;
    let info = inspect_lock(&args.target, threshold)?;

    if args.json {
        let report = json!({
            "target": args.target,
            "locked": info.is_some(),
            "stale_after_secs": threshold.as_secs(),
            "lock": info,
        });
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| AtomupError::UserError(format!("failed to render status: {}", e)))?;
        println!("{}", rendered);
        return Ok(());
    }

    let Some(lock) = info else {
        println!("Not locked: {}", args.target.display());
        return Ok(());
    };

    println!("Locked: {}", args.target.display());
    println!();
    println!(
        "  Marker:     {} ({})",
        lock.lock_path.display(),
        match lock.kind {
            MarkerKind::File => "file",
            MarkerKind::Directory => "directory",
        }
    );
    if let Some(meta) = &lock.metadata {
        println!("  Owner:      {}", meta.owner);
        println!("  PID:        {}", meta.pid);
        println!("  Created:    {}", meta.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  Age:        {}", format_age(lock.age));
    if lock.staging_present {
        println!("  Staging:    present");
    }
    if lock.is_stale {
        println!(
            "  Status:     STALE (exceeds {} threshold)",
            format_age(threshold)
        );
        println!();
        println!(
            "Note: the next writer will reclaim it. Use `atomup clear {}` to remove it now.",
            args.target.display()
        );
    }

    Ok(())
}
