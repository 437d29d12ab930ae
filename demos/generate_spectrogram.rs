//! Example: Generate the mel spectrogram of one audio file
//!
//! Usage:
//!   cargo run --example generate_spectrogram -- [--out DIR] [--image] [--json] [--config FILE] <file>
//!
//! Writes `<DIR>/<stem>.npy` (and `<DIR>/<stem>.png` with `--image`).

use clipgram::{generate_spectrogram, FsArtifactStore, SpectralConfig, SpectralEngine, StoreOptions};
use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut out_dir = PathBuf::from("spectrograms");
    let mut render_image = false;
    let mut json = false;
    let mut config = SpectralConfig::default();
    let mut path: Option<PathBuf> = None;

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--out" => {
                out_dir = PathBuf::from(args.first().ok_or("--out requires a value")?);
                args.remove(0);
            }
            "--config" => {
                let file = args.first().ok_or("--config requires a value")?;
                config = serde_json::from_str(&std::fs::read_to_string(file)?)?;
                args.remove(0);
            }
            "--image" => render_image = true,
            "--json" => json = true,
            "--help" | "-h" => {
                eprintln!(
                    "Usage: generate_spectrogram [--out DIR] [--image] [--json] [--config FILE] <file>\n\
                     \n\
                     --out DIR      Artifact directory (default: spectrograms)\n\
                     --image        Also render a PNG\n\
                     --json         Print the artifact record as JSON\n\
                     --config FILE  JSON spectral configuration\n"
                );
                return Ok(());
            }
            _ => path = Some(PathBuf::from(a)),
        }
    }

    let Some(path) = path else {
        eprintln!("ERROR: Provide an audio file path. Use --help for usage.");
        std::process::exit(2);
    };

    let options = StoreOptions {
        render_image,
        ..StoreOptions::default()
    };
    let store = FsArtifactStore::new(out_dir, options)?;
    let engine = SpectralEngine::new();

    let generated = generate_spectrogram(&path, &engine, &store, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&generated)?);
    } else {
        println!("Spectrogram Results:");
        println!("  Source: {}", generated.record.source_id);
        println!("  Shape: {:?}", generated.record.shape);
        println!("  Array: {}", generated.record.storage_path.display());
        if let Some(image) = &generated.record.image_path {
            println!("  Image: {}", image.display());
        }
        println!(
            "  Duration: {:.2} s at {} Hz",
            generated.metadata.duration_seconds, generated.metadata.sample_rate
        );
        println!("  Processing time: {:.2} ms", generated.metadata.processing_time_ms);
    }

    Ok(())
}
