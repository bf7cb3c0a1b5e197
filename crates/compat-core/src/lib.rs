//! Package ingestion and compatibility analysis for extension galleries.
//!
//! This crate takes a directory of extension archives, extracts them,
//! parses their manifests into [`Package`](manifest::Package) records, and
//! classifies each extension as compatible or incompatible with a base
//! installation by comparing referenced binary modules against the modules
//! the base installation ships.

pub mod analyzer;
pub mod catalog;
pub mod error;
pub mod extract;
pub mod inspect;
pub mod inventory;
pub mod manifest;
pub mod pipeline;
pub mod version;

/// The canonical filename for extension manifest files.
///
/// Every extracted package is expected to carry a file with this name at
/// the root of its directory.
pub const MANIFEST_FILENAME: &str = "extension.vsixmanifest";

/// Filename of the JSON package record written next to the manifest after
/// a successful parse, and read back when the catalog is rebuilt.
pub const PACKAGE_RECORD_FILENAME: &str = "extension.json";

/// Archive suffixes recognized by the extractor. Anything else is ignored.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["vsix", "zip"];

/// File extension of compiled binary modules.
pub const MODULE_EXTENSION: &str = "dll";

/// Module name prefixes belonging to the base runtime itself. References
/// with these prefixes are treated as always present and never flagged
/// missing.
pub const RESERVED_MODULE_PREFIXES: &[&str] = &["System", "mscorlib"];

pub use analyzer::CompatibilityResult;
pub use catalog::PackageCatalog;
pub use error::{Error, Result};
pub use extract::{ExtractionSummary, Outcome};
pub use inspect::{ModuleInspector, PeImportInspector};
pub use inventory::ModuleInventory;
pub use manifest::{ManifestFormat, ManifestParser, Package, Strictness};
pub use pipeline::{RunConfig, RunReport};
pub use version::PackageVersion;
