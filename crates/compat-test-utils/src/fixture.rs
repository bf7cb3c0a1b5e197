//! Package directory and archive fixtures for pipeline tests.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Canonical manifest filename, mirroring the core crate's constant.
///
/// Hardcoded here so this crate stays free of workspace dependencies and
/// can be consumed from any sibling crate's test suite.
const MANIFEST_FILENAME: &str = "extension.vsixmanifest";

/// A temporary directory holding extracted-package fixtures.
///
/// # Example
///
/// ```rust,no_run
/// use compat_test_utils::fixture::ExtensionFixture;
///
/// let fixture = ExtensionFixture::new();
/// let dir = fixture.package_with_manifest("my-ext", "<Vsix/>");
/// assert!(dir.join("extension.vsixmanifest").exists());
/// ```
pub struct ExtensionFixture {
    temp_dir: TempDir,
}

impl Default for ExtensionFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("ExtensionFixture: failed to create temp dir"),
        }
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create an empty package directory.
    pub fn empty_package(&self, name: &str) -> PathBuf {
        let dir = self.root().join(name);
        fs::create_dir_all(&dir).expect("ExtensionFixture: failed to create package dir");
        dir
    }

    /// Create a package directory containing a manifest with the given
    /// XML content.
    pub fn package_with_manifest(&self, name: &str, manifest_xml: &str) -> PathBuf {
        let dir = self.empty_package(name);
        fs::write(dir.join(MANIFEST_FILENAME), manifest_xml)
            .expect("ExtensionFixture: failed to write manifest");
        dir
    }
}

/// Write a zip archive at `path` with the given `(name, contents)`
/// entries. Entry names may contain `/` separators for nesting.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("write_zip: failed to create parent dir");
    }
    let file = fs::File::create(path).expect("write_zip: failed to create archive");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, contents) in entries {
        writer
            .start_file(*name, options)
            .expect("write_zip: failed to start entry");
        writer
            .write_all(contents)
            .expect("write_zip: failed to write entry");
    }
    writer.finish().expect("write_zip: failed to finish archive");
}
