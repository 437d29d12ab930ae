//! Batch file-name normalisation for a song directory
//!
//! Each matching file becomes `{seq:03}_{normalized}.{ext}`, numbered from 1
//! in sorted listing order. Renames are applied in order with no rollback: a
//! failure stops the run and leaves earlier renames in place. The returned
//! [`RenameReport`] records exactly which files moved. Numbering restarts at 1
//! on every run, so running twice prefixes a second sequence number.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::SpectrogramError;

/// One planned rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameOp {
    /// 1-based position in listing order
    pub sequence: usize,
    /// Current path
    pub from: PathBuf,
    /// Target path
    pub to: PathBuf,
}

/// The rename that stopped a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameFailure {
    /// Operation that failed
    pub op: RenameOp,
    /// Underlying cause
    pub message: String,
}

/// Outcome of [`apply_renames`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    /// Renames that were carried out, in order
    pub completed: Vec<RenameOp>,
    /// First failure, after which nothing else was attempted
    pub failed: Option<RenameFailure>,
    /// Operations never attempted because of the failure
    pub skipped: usize,
}

impl RenameReport {
    /// True when every planned rename was applied
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// Normalise one file name (extension is dropped)
///
/// Bracketed `[...]` and parenthesised `(...)` annotations are removed,
/// dashes and spaces become `_`, anything outside `[A-Za-z0-9_]` is dropped,
/// the result is lowercased, and runs of `_` collapse with none left at
/// either end.
pub fn normalize_song_name(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };

    let stripped = strip_annotations(stem);

    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        let c = match c {
            '-' | ' ' => '_',
            c => c,
        };
        if !(c.is_ascii_alphanumeric() || c == '_') {
            continue;
        }
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c.to_ascii_lowercase());
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Remove `[...]` and `(...)` spans, shortest match first
///
/// An opener without a closer is left in place.
fn strip_annotations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let closer = match c {
            '[' => Some(']'),
            '(' => Some(')'),
            _ => None,
        };

        if let Some(closer) = closer {
            if let Some(end) = rest[1..].find(closer) {
                rest = &rest[1 + end + 1..];
                continue;
            }
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Plan renames for every file in `dir` whose name ends with `.{extension}`
/// (case-insensitive), in sorted name order
pub fn plan_renames(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<RenameOp>, SpectrogramError> {
    let dir = dir.as_ref();
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    let suffix = format!(".{}", extension);

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| SpectrogramError::read_failure(dir, e))? {
        let entry = entry.map_err(|e| SpectrogramError::read_failure(dir, e))?;
        if !entry.path().is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if name.to_ascii_lowercase().ends_with(&suffix) => names.push(name),
            Ok(_) => {}
            Err(raw) => log::warn!("Skipping non-UTF-8 file name {:?}", raw),
        }
    }
    names.sort();

    let ops = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let sequence = i + 1;
            let target = format!(
                "{:03}_{}.{}",
                sequence,
                normalize_song_name(&name),
                extension
            );
            RenameOp {
                sequence,
                from: dir.join(&name),
                to: dir.join(target),
            }
        })
        .collect();

    Ok(ops)
}

/// Apply planned renames in order, stopping at the first failure
///
/// A target that already exists (and is not the source itself) counts as a
/// failure rather than being overwritten.
pub fn apply_renames(ops: &[RenameOp]) -> RenameReport {
    let mut report = RenameReport::default();

    for (i, op) in ops.iter().enumerate() {
        log::info!("Renaming: {} -> {}", op.from.display(), op.to.display());

        let result = if op.from == op.to {
            Ok(())
        } else if op.to.exists() {
            Err(format!("target {} already exists", op.to.display()))
        } else {
            fs::rename(&op.from, &op.to).map_err(|e| e.to_string())
        };

        match result {
            Ok(()) => report.completed.push(op.clone()),
            Err(message) => {
                log::error!(
                    "Rename of {} failed after {} completed: {}",
                    op.from.display(),
                    report.completed.len(),
                    message
                );
                report.failed = Some(RenameFailure {
                    op: op.clone(),
                    message,
                });
                report.skipped = ops.len() - i - 1;
                break;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_annotations() {
        assert_eq!(
            normalize_song_name("Artist - Song Title (Official Video) [HD].mp3"),
            "artist_song_title"
        );
    }

    #[test]
    fn test_normalize_drops_disallowed_characters() {
        assert_eq!(normalize_song_name("Beyoncé - Halo!!.mp3"), "beyonc_halo");
        assert_eq!(normalize_song_name("a--b  c.mp3"), "a_b_c");
        assert_eq!(normalize_song_name("__lead_trail__.mp3"), "lead_trail");
    }

    #[test]
    fn test_normalize_is_non_greedy_and_keeps_unclosed() {
        assert_eq!(normalize_song_name("a (x) b (y) c.mp3"), "a_b_c");
        assert_eq!(normalize_song_name("a (unclosed.mp3"), "a_unclosed");
    }

    #[test]
    fn test_plan_orders_and_numbers() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b song.mp3", "A Song.MP3", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let ops = plan_renames(dir.path(), "mp3").unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].from, dir.path().join("A Song.MP3"));
        assert_eq!(ops[0].to, dir.path().join("001_a_song.mp3"));
        assert_eq!(ops[1].to, dir.path().join("002_b_song.mp3"));
    }

    #[test]
    fn test_apply_renames_everything() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Track One.mp3"), b"1").unwrap();
        std::fs::write(dir.path().join("Track Two.mp3"), b"2").unwrap();

        let ops = plan_renames(dir.path(), ".mp3").unwrap();
        let report = apply_renames(&ops);
        assert!(report.is_complete());
        assert_eq!(report.completed.len(), 2);
        assert_eq!(std::fs::read(dir.path().join("001_track_one.mp3")).unwrap(), b"1");
        assert_eq!(std::fs::read(dir.path().join("002_track_two.mp3")).unwrap(), b"2");
    }

    #[test]
    fn test_partial_failure_is_reported_without_rollback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"a").unwrap();
        std::fs::write(dir.path().join("b.mp3"), b"b").unwrap();
        std::fs::write(dir.path().join("c.mp3"), b"c").unwrap();

        let ops = plan_renames(dir.path(), "mp3").unwrap();
        // Occupy the second target after planning
        std::fs::write(&ops[1].to, b"keep").unwrap();
        let report = apply_renames(&ops);

        assert!(!report.is_complete());
        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.skipped, 1);
        assert!(dir.path().join("001_a.mp3").exists());
        assert!(dir.path().join("b.mp3").exists());
        assert!(dir.path().join("c.mp3").exists());
        assert_eq!(std::fs::read(dir.path().join("002_b.mp3")).unwrap(), b"keep");
    }
}
