//! Compatibility classification by module set subtraction.
//!
//! An extension is compatible with a base installation iff every module it
//! references, minus the reserved runtime modules, is present in the base
//! installation's inventory. No transitive resolution happens here: an
//! extension with zero references trivially classifies as compatible.

use std::collections::BTreeSet;
use std::path::Path;

use crate::RESERVED_MODULE_PREFIXES;
use crate::error::Result;
use crate::inspect::ModuleInspector;
use crate::inventory::ModuleInventory;

/// Classification of one extension against a base installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityResult {
    pub extension_id: String,
    pub compatible: bool,
    /// Referenced modules absent from the base inventory. Empty iff
    /// compatible.
    pub missing_modules: BTreeSet<String>,
}

/// Whether a referenced module belongs to the base runtime's reserved
/// namespace. Reserved modules are treated as always present.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_MODULE_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Classify an extension from its already-collected reference set.
///
/// Pure function: filters out reserved runtime modules, then computes
/// `referenced - available` with case-insensitive matching.
pub fn classify(
    extension_id: &str,
    references: &BTreeSet<String>,
    inventory: &ModuleInventory,
) -> CompatibilityResult {
    let missing_modules: BTreeSet<String> = references
        .iter()
        .filter(|name| !is_reserved(name))
        .filter(|name| !inventory.contains(name))
        .cloned()
        .collect();

    CompatibilityResult {
        extension_id: extension_id.to_string(),
        compatible: missing_modules.is_empty(),
        missing_modules,
    }
}

/// Inspect an extracted extension directory and classify it.
///
/// The extension id used in the result is the directory name.
pub fn analyze_directory(
    dir: &Path,
    inventory: &ModuleInventory,
    inspector: &dyn ModuleInspector,
) -> Result<CompatibilityResult> {
    let extension_id = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let references = inspector.inspect(dir)?;
    tracing::debug!(extension = %extension_id, references = references.len(), "inspected extension");
    Ok(classify(&extension_id, &references, inventory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn refs(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Inventory built from a real directory scan so matching behaves as
    /// it does in production.
    fn inventory_of(names: &[&str]) -> ModuleInventory {
        let temp = tempfile::TempDir::new().unwrap();
        for name in names {
            std::fs::write(temp.path().join(format!("{name}.dll")), b"MZ").unwrap();
        }
        ModuleInventory::build(temp.path()).unwrap()
    }

    #[test]
    fn test_all_references_available_is_compatible() {
        let inventory = inventory_of(&["A", "B", "C"]);
        let result = classify("ext", &refs(&["A", "B"]), &inventory);
        assert!(result.compatible);
        assert!(result.missing_modules.is_empty());
    }

    #[test]
    fn test_missing_reference_is_incompatible() {
        let inventory = inventory_of(&["A", "B", "C"]);
        let result = classify("ext", &refs(&["A", "D"]), &inventory);
        assert!(!result.compatible);
        assert_eq!(result.missing_modules, refs(&["D"]));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let inventory = inventory_of(&["Foo"]);
        let result = classify("ext", &refs(&["foo"]), &inventory);
        assert!(result.compatible);
    }

    #[test]
    fn test_reserved_modules_never_count_as_missing() {
        let inventory = inventory_of(&[]);
        let result = classify(
            "ext",
            &refs(&["System.Core", "mscorlib", "System"]),
            &inventory,
        );
        assert!(result.compatible);
    }

    #[test]
    fn test_zero_references_is_trivially_compatible() {
        let inventory = inventory_of(&["A"]);
        let result = classify("ext", &refs(&[]), &inventory);
        assert!(result.compatible);
    }

    #[test]
    fn test_reserved_prefix_is_case_sensitive() {
        // "system.Foo" does not match the reserved "System" prefix.
        let inventory = inventory_of(&[]);
        let result = classify("ext", &refs(&["system.Foo"]), &inventory);
        assert!(!result.compatible);
    }

    #[test]
    fn test_missing_modules_are_ordered() {
        let inventory = inventory_of(&[]);
        let result = classify("ext", &refs(&["Zeta", "Alpha"]), &inventory);
        let missing: Vec<&str> = result.missing_modules.iter().map(|s| s.as_str()).collect();
        assert_eq!(missing, vec!["Alpha", "Zeta"]);
    }
}
