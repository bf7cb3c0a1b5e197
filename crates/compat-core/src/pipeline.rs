//! End-to-end ingestion and classification pipeline.
//!
//! Sequences extraction, cataloging, and analysis over a directory of
//! extension archives: extract everything (idempotently), build the base
//! installation's module inventory once, parse and catalog each
//! extension's manifest, classify each extension, and report aggregate
//! results. Per-package failures are isolated and reported; only
//! directory-level misconfiguration aborts the run.

use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzer::{self, CompatibilityResult};
use crate::catalog::{self, PackageCatalog};
use crate::error::{Error, Result};
use crate::extract;
use crate::inspect::ModuleInspector;
use crate::inventory::ModuleInventory;
use crate::manifest::{ManifestParser, Strictness};

/// Subdirectory of a source directory that receives extracted archives.
pub const SCRATCH_DIR_NAME: &str = "extracted";

/// Inputs for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory containing extension archives.
    pub extensions_dir: PathBuf,
    /// Directory containing the base installation's archives.
    pub base_install_dir: PathBuf,
    /// Required-field policy for manifest parsing.
    pub strictness: Strictness,
}

/// A package that could not be fully processed, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedPackage {
    pub name: String,
    pub reason: String,
}

/// Aggregate results of one pipeline run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Archives newly unpacked this run.
    pub extracted: usize,
    /// Archives already unpacked by a previous run.
    pub already_extracted: usize,
    /// Modules the base installation provides.
    pub base_modules: usize,
    /// Ids of extensions whose referenced modules are all available.
    pub compatible: Vec<String>,
    /// Classifications with at least one missing module.
    pub incompatible: Vec<CompatibilityResult>,
    /// Packages skipped due to extraction, manifest, or inspection
    /// failures.
    pub skipped: Vec<SkippedPackage>,
    /// Packages successfully cataloged this run.
    pub cataloged: usize,
    /// Cataloged packages installed via MSI.
    pub msi_count: usize,
    /// Cataloged packages installed for all users.
    pub all_users_count: usize,
}

/// Run the whole pipeline.
///
/// # Errors
///
/// Returns [`Error::Configuration`] before any extraction attempt when
/// either root directory does not exist. Everything else is per-package
/// and lands in [`RunReport::skipped`].
pub fn run(config: &RunConfig, inspector: &dyn ModuleInspector) -> Result<RunReport> {
    require_dir(&config.extensions_dir)?;
    require_dir(&config.base_install_dir)?;

    let mut report = RunReport::default();

    // Base installation first: its modules define the baseline.
    let base_scratch = config.base_install_dir.join(SCRATCH_DIR_NAME);
    let base_summary = extract::extract_all(&config.base_install_dir, &base_scratch)?;
    record_extraction(&mut report, base_summary);

    let inventory = ModuleInventory::build(&base_scratch)?;
    report.base_modules = inventory.len();

    let ext_scratch = config.extensions_dir.join(SCRATCH_DIR_NAME);
    let ext_summary = extract::extract_all(&config.extensions_dir, &ext_scratch)?;
    record_extraction(&mut report, ext_summary);

    let mut catalog = PackageCatalog::new(&ext_scratch);
    let parser = ManifestParser::new(config.strictness);

    for dir in extension_dirs(&ext_scratch)? {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Manifest and record-write failures exclude the package from the
        // catalog but do not prevent classification.
        match parser
            .parse_package(&dir)
            .and_then(|package| catalog::write_record(&dir, &package).map(|()| package))
        {
            Ok(package) => {
                catalog.upsert(package)?;
            }
            Err(e) => {
                tracing::warn!(extension = %name, error = %e, "cataloging failed");
                report.skipped.push(SkippedPackage {
                    name: name.clone(),
                    reason: e.to_string(),
                });
            }
        }

        match analyzer::analyze_directory(&dir, &inventory, inspector) {
            Ok(result) if result.compatible => report.compatible.push(result.extension_id),
            Ok(result) => report.incompatible.push(result),
            Err(e) => {
                tracing::warn!(extension = %name, error = %e, "inspection failed");
                report.skipped.push(SkippedPackage {
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    for package in catalog.packages()? {
        report.cataloged += 1;
        if package.is_msi {
            report.msi_count += 1;
        }
        if package.all_users {
            report.all_users_count += 1;
        }
    }

    Ok(report)
}

fn require_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::Configuration {
            path: path.to_path_buf(),
        })
    }
}

fn record_extraction(report: &mut RunReport, summary: extract::ExtractionSummary) {
    report.extracted += summary.extracted;
    report.already_extracted += summary.skipped;
    for (archive, error) in summary.failures {
        report.skipped.push(SkippedPackage {
            name: archive
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            reason: error.to_string(),
        });
    }
}

/// Sorted extension directories under the scratch root.
fn extension_dirs(scratch: &Path) -> Result<Vec<PathBuf>> {
    if !scratch.exists() {
        return Ok(Vec::new());
    }
    let mut dirs: Vec<PathBuf> = fs::read_dir(scratch)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}
