//! Implementation of the `atomup clear` command.

use crate::cli::ClearArgs;
use crate::config::Config;
use crate::error::Result;
use crate::locks::{clear_lock, format_age};

pub fn cmd_clear(args: ClearArgs, config: &Config) -> Result<()> {
    let cleared = clear_lock(&args.target, config.stale_after(), args.force)?;

    println!("Cleared lock: {}", cleared.lock_path.display());
    println!();
    println!("Lock details:");
    if let Some(meta) = &cleared.metadata {
        println!("  Owner:      {}", meta.owner);
        println!("  PID:        {}", meta.pid);
        println!("  Created:    {}", meta.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  Age:        {}", format_age(cleared.age));
    if cleared.is_stale {
        println!("  Status:     was STALE");
    }
    if cleared.staging_present {
        println!(
            "  Note:       leftover staging file is removed by the next writer"
        );
    }

    Ok(())
}
