//! In-memory package catalog over an extraction root.
//!
//! The catalog is an explicit owned object scoped to one run, lazily
//! populated on first read by scanning the root directory for extracted
//! packages that carry an `extension.json` record. Mutation goes through
//! [`PackageCatalog::upsert`], which replaces any record with the same id.

use std::fs;
use std::path::{Path, PathBuf};

use crate::PACKAGE_RECORD_FILENAME;
use crate::error::{Error, Result};
use crate::manifest::Package;

/// Process-scoped cache of [`Package`] records keyed by id.
///
/// Safe only under single-threaded use; the `&mut self` API makes that
/// explicit.
#[derive(Debug)]
pub struct PackageCatalog {
    root: PathBuf,
    cache: Option<Vec<Package>>,
}

impl PackageCatalog {
    /// Create a catalog over an extraction root. Nothing is read until
    /// the first access.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: None,
        }
    }

    /// All cached packages, building the cache on first call.
    ///
    /// The freshly built cache is sorted by `date_published` descending
    /// (most recently observed first). Note that [`upsert`](Self::upsert)
    /// appends without re-sorting, so ordering after mutation is append
    /// order. That is accepted behavior and pinned by a test.
    pub fn packages(&mut self) -> Result<&[Package]> {
        if self.cache.is_none() {
            self.cache = Some(self.scan_root()?);
        }
        Ok(self.cache.as_deref().unwrap_or_default())
    }

    /// Look up a package by id.
    ///
    /// A cached package is returned directly. On a cache miss the record
    /// is read from `{root}/{id}/extension.json` without inserting it
    /// into the cache; `Ok(None)` means no such record exists on disk.
    pub fn get(&mut self, id: &str) -> Result<Option<Package>> {
        if let Some(found) = self.packages()?.iter().find(|p| p.id == id) {
            return Ok(Some(found.clone()));
        }

        let record = self.root.join(id).join(PACKAGE_RECORD_FILENAME);
        if !record.exists() {
            return Ok(None);
        }
        read_record(&record).map(Some)
    }

    /// Insert a package, replacing any existing record with the same id.
    ///
    /// Last write wins: the previous record is removed and the new one is
    /// appended at the end.
    pub fn upsert(&mut self, package: Package) -> Result<()> {
        self.packages()?;
        let cache = self.cache.as_mut().expect("cache built by packages()");
        cache.retain(|p| p.id != package.id);
        cache.push(package);
        Ok(())
    }

    /// Number of cached packages.
    pub fn len(&mut self) -> Result<usize> {
        Ok(self.packages()?.len())
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.packages()?.is_empty())
    }

    /// Scan the root for package subdirectories carrying a record file.
    /// Unreadable records are logged and skipped; a missing root yields
    /// an empty catalog.
    fn scan_root(&self) -> Result<Vec<Package>> {
        let mut packages = Vec::new();
        if !self.root.exists() {
            return Ok(packages);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let record = entry.path().join(PACKAGE_RECORD_FILENAME);
            if !record.exists() {
                continue;
            }
            match read_record(&record) {
                Ok(package) => packages.push(package),
                Err(e) => {
                    tracing::warn!(record = %record.display(), error = %e, "skipping unreadable package record");
                }
            }
        }

        packages.sort_by(|a, b| b.date_published.cmp(&a.date_published));
        Ok(packages)
    }
}

/// Write a package record next to its extracted contents so later runs
/// can rebuild the catalog without re-parsing manifests.
pub fn write_record(package_dir: &Path, package: &Package) -> Result<()> {
    let json = serde_json::to_string_pretty(package)
        .map_err(|e| Error::manifest(package_dir, format!("failed to serialize record: {e}")))?;
    fs::write(package_dir.join(PACKAGE_RECORD_FILENAME), json)?;
    Ok(())
}

fn read_record(path: &Path) -> Result<Package> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| Error::manifest(path, e.to_string()))
}
