//! Example: Normalise song file names in a directory
//!
//! Usage:
//!   cargo run --example rename_songs -- [--dry-run] [--ext EXT] [DIR]
//!
//! Files become `{seq:03}_{normalized}.{ext}`. There is no rollback: if a
//! rename fails, earlier renames stay applied and the report lists them.

use clipgram::library::{apply_renames, plan_renames};
use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut dry_run = false;
    let mut extension = String::from("mp3");
    let mut dir = PathBuf::from(".");

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--dry-run" => dry_run = true,
            "--ext" => {
                extension = args.first().ok_or("--ext requires a value")?.clone();
                args.remove(0);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: rename_songs [--dry-run] [--ext EXT] [DIR]\n\
                     \n\
                     --dry-run  Print planned renames only\n\
                     --ext EXT  File extension to match (default: mp3)\n"
                );
                return Ok(());
            }
            _ => dir = PathBuf::from(a),
        }
    }

    let ops = plan_renames(&dir, &extension)?;
    if dry_run {
        for op in &ops {
            println!("Would rename: {} -> {}", op.from.display(), op.to.display());
        }
        return Ok(());
    }

    let report = apply_renames(&ops);
    for op in &report.completed {
        println!("Renamed: {} -> {}", op.from.display(), op.to.display());
    }

    if let Some(failure) = &report.failed {
        eprintln!(
            "ERROR: stopped at {}: {} ({} renamed, {} not attempted)",
            failure.op.from.display(),
            failure.message,
            report.completed.len(),
            report.skipped
        );
        std::process::exit(1);
    }

    Ok(())
}
