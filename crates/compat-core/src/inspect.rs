//! Module reference inspection.
//!
//! The analyzer only needs one thing from a binary: the names of the
//! modules it links against. [`ModuleInspector`] keeps that concern
//! behind a narrow trait so the concrete mechanism is swappable and tests
//! can substitute a fake.

use std::collections::BTreeSet;
use std::path::Path;

use object::Object;
use walkdir::WalkDir;

use crate::MODULE_EXTENSION;
use crate::error::{Error, Result};

/// Produces the set of module names referenced by the binaries in a
/// directory.
///
/// Returned names are extension-free module names. Implementations report
/// failures as [`Error::Inspection`].
pub trait ModuleInspector {
    fn inspect(&self, dir: &Path) -> Result<BTreeSet<String>>;
}

/// Inspector that reads the import table of each PE module under the
/// directory.
///
/// Files that are not valid PE images (resource-only payloads, scripts
/// with a module extension) are skipped with a warning rather than
/// failing the whole directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeImportInspector;

impl PeImportInspector {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleInspector for PeImportInspector {
    fn inspect(&self, dir: &Path) -> Result<BTreeSet<String>> {
        let mut references = BTreeSet::new();

        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(|e| Error::Inspection {
                dir: dir.to_path_buf(),
                reason: e.to_string(),
            })?;
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

            let data = std::fs::read(path).map_err(|e| Error::Inspection {
                dir: dir.to_path_buf(),
                reason: format!("failed to read {}: {e}", path.display()),
            })?;

            let file = match object::File::parse(&*data) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!(module = %path.display(), error = %e, "not a parseable binary, skipping");
                    continue;
                }
            };
            let imports = match file.imports() {
                Ok(imports) => imports,
                Err(e) => {
                    tracing::warn!(module = %path.display(), error = %e, "unreadable import table, skipping");
                    continue;
                }
            };

            for import in imports {
                let library = String::from_utf8_lossy(import.library());
                references.insert(strip_module_extension(&library).to_string());
            }
        }

        Ok(references)
    }
}

/// Remove a trailing module extension from a referenced library name,
/// case-insensitively (`"Kernel32.DLL"` -> `"Kernel32"`).
///
/// Import names come through lossy UTF-8 conversion and may end
/// mid-character; `get` keeps the split on a char boundary and leaves
/// such names untouched.
fn strip_module_extension(name: &str) -> &str {
    let suffix = format!(".{MODULE_EXTENSION}");
    let Some(split) = name.len().checked_sub(suffix.len()).filter(|&s| s > 0) else {
        return name;
    };
    match (name.get(..split), name.get(split..)) {
        (Some(stem), Some(tail)) if tail.eq_ignore_ascii_case(&suffix) => stem,
        _ => name,
    }
}
