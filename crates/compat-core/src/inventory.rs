//! Module inventory of a base installation.

use std::collections::HashSet;
use std::path::Path;

use walkdir::WalkDir;

use crate::MODULE_EXTENSION;
use crate::error::Result;

/// The set of module names a base installation provides.
///
/// Names are matched case-insensitively with file extensions stripped.
/// Built once per run, immutable thereafter.
#[derive(Debug, Clone, Default)]
pub struct ModuleInventory {
    /// Lowercased module name stems.
    names: HashSet<String>,
}

impl ModuleInventory {
    /// Build the inventory by scanning `root` recursively for module
    /// files.
    pub fn build(root: &Path) -> Result<Self> {
        let mut names = HashSet::new();
        if !root.exists() {
            tracing::warn!(root = %root.display(), "inventory root does not exist, inventory is empty");
            return Ok(Self { names });
        }
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(std::io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_module = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(MODULE_EXTENSION));
            if !is_module {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.insert(stem.to_ascii_lowercase());
            }
        }
        tracing::info!(modules = names.len(), root = %root.display(), "built module inventory");
        Ok(Self { names })
    }

    /// Case-insensitive membership test. `name` must already be
    /// extension-free.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Sorted module names, for reporting.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}
