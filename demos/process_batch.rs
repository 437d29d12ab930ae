//! Example: Generate spectrograms for many files in parallel
//!
//! Usage:
//!   cargo run --release --example process_batch -- [--jobs N] [--out DIR] [--image] [--json] <file1> <file2> ...
//!
//! Parallelism is across files. Each transform is single-threaded and all
//! files share one filterbank cache.

use clipgram::{generate_batch, FsArtifactStore, SpectralConfig, SpectralEngine, StoreOptions};
use std::env;
use std::path::PathBuf;
use std::time::Instant;

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut render_image = false;
    let mut jobs: Option<usize> = None;
    let mut out_dir = PathBuf::from("spectrograms");
    let mut paths: Vec<PathBuf> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--image" => render_image = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--out" => {
                out_dir = PathBuf::from(args.first().ok_or("--out requires a value")?);
                args.remove(0);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: process_batch [--jobs N] [--out DIR] [--image] [--json] <file1> <file2> ...\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --out DIR  Artifact directory (default: spectrograms)\n\
                     --image    Also render PNGs\n\
                     --json     Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(PathBuf::from(a)),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let options = StoreOptions {
        render_image,
        ..StoreOptions::default()
    };
    let store = FsArtifactStore::new(out_dir, options)?;
    let engine = SpectralEngine::new();
    let config = SpectralConfig::default();

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let results = pool.install(|| generate_batch(&paths, &engine, &store, &config));
    let elapsed = t0.elapsed().as_secs_f32();

    let mut failures = 0usize;
    for (path, result) in paths.iter().zip(results.iter()) {
        match result {
            Ok(generated) => {
                if json {
                    println!("{}", serde_json::to_string(generated)?);
                } else {
                    println!(
                        "OK   {} -> {} {:?}",
                        path.display(),
                        generated.record.storage_path.display(),
                        generated.record.shape
                    );
                }
            }
            Err(e) => {
                failures += 1;
                if json {
                    println!(
                        "{{\"path\":{},\"error\":{}}}",
                        serde_json::to_string(&path.display().to_string())?,
                        serde_json::to_string(&e.to_string())?
                    );
                } else {
                    println!("FAIL {}: {}", path.display(), e);
                }
            }
        }
    }

    eprintln!(
        "Done: {} ok, {} failed in {:.2}s",
        paths.len() - failures,
        failures,
        elapsed
    );

    Ok(())
}
