//! Archive extraction with idempotent, deterministic target directories.
//!
//! Each recognized archive is unpacked into `{scratch}/{stem}`, where the
//! stem is the archive filename without its final extension. An existing
//! target directory means the archive was already processed: the extractor
//! skips it instead of failing, so repeated runs over the same scratch
//! directory only unpack each archive once.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::ARCHIVE_EXTENSIONS;
use crate::error::{Error, Result};

/// What the extractor did with one archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The archive was unpacked into a fresh target directory.
    Extracted,
    /// The target directory already existed; nothing was done.
    Skipped,
}

/// Aggregate result of extracting every archive under a source directory.
#[derive(Debug, Default)]
pub struct ExtractionSummary {
    pub extracted: usize,
    pub skipped: usize,
    /// Per-archive failures. These do not abort the run.
    pub failures: Vec<(PathBuf, Error)>,
}

/// Whether a path carries one of the recognized archive suffixes.
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            ARCHIVE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Deterministic target directory for an archive: the scratch directory
/// joined with the archive's filename stem.
pub fn target_dir(archive: &Path, scratch: &Path) -> Result<PathBuf> {
    let stem = archive
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Extraction {
            archive: archive.to_path_buf(),
            reason: "archive has no usable filename stem".to_string(),
        })?;
    Ok(scratch.join(stem))
}

/// Extract one archive into its deterministic target directory.
///
/// Returns [`Outcome::Skipped`] without touching anything when the target
/// directory already exists. On failure the partially written target is
/// removed, so a retried run starts from a clean state.
pub fn extract_archive(archive: &Path, scratch: &Path) -> Result<Outcome> {
    let target = target_dir(archive, scratch)?;
    if target.exists() {
        tracing::debug!(archive = %archive.display(), "already extracted, skipping");
        return Ok(Outcome::Skipped);
    }

    match unpack(archive, &target) {
        Ok(()) => {
            tracing::info!(archive = %archive.display(), target = %target.display(), "extracted");
            Ok(Outcome::Extracted)
        }
        Err(reason) => {
            // Leave no indeterminate half-written directory behind.
            if target.exists() {
                if let Err(cleanup) = fs::remove_dir_all(&target) {
                    tracing::warn!(target = %target.display(), error = %cleanup, "failed to clean up after extraction failure");
                }
            }
            Err(Error::Extraction {
                archive: archive.to_path_buf(),
                reason,
            })
        }
    }
}

/// Extract every recognized archive directly under `source_dir` into
/// `scratch`. Non-archive files are ignored; per-archive failures are
/// collected, not fatal.
pub fn extract_all(source_dir: &Path, scratch: &Path) -> Result<ExtractionSummary> {
    let mut summary = ExtractionSummary::default();

    let mut archives: Vec<PathBuf> = fs::read_dir(source_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_archive(path))
        .collect();
    archives.sort();

    for archive in archives {
        match extract_archive(&archive, scratch) {
            Ok(Outcome::Extracted) => summary.extracted += 1,
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Err(e) => {
                tracing::warn!(archive = %archive.display(), error = %e, "extraction failed");
                summary.failures.push((archive, e));
            }
        }
    }

    Ok(summary)
}

fn unpack(archive: &Path, target: &Path) -> std::result::Result<(), String> {
    let file = fs::File::open(archive).map_err(|e| format!("failed to open archive: {e}"))?;
    let mut zip =
        zip::ZipArchive::new(file).map_err(|e| format!("invalid or corrupt archive: {e}"))?;

    fs::create_dir_all(target).map_err(|e| format!("failed to create target directory: {e}"))?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| format!("failed to read entry {i}: {e}"))?;

        // Entries with unsafe paths (absolute, or escaping the target via
        // `..`) are skipped.
        let Some(entry_path) = entry.enclosed_name() else {
            tracing::warn!(archive = %archive.display(), entry = entry.name(), "skipping entry with unsafe path");
            continue;
        };
        let output_path = target.join(entry_path);

        if entry.is_dir() {
            fs::create_dir_all(&output_path)
                .map_err(|e| format!("failed to create directory: {e}"))?;
        } else {
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("failed to create parent directory: {e}"))?;
            }
            let mut outfile = fs::File::create(&output_path)
                .map_err(|e| format!("failed to create file: {e}"))?;
            io::copy(&mut entry, &mut outfile).map_err(|e| format!("failed to write file: {e}"))?;
        }
    }

    Ok(())
}
