//! Manifest parsing for `extension.vsixmanifest` files.
//!
//! Two structurally different manifest schemas exist in the wild. The
//! modern schema identifies the package through an `Identity` element and
//! carries a `DisplayName`; the legacy schema uses an `Identifier` element
//! and plain child elements. Both map onto the same [`Package`] record via
//! a per-format field-mapping table.
//!
//! Manifests from different tool versions declare different and
//! inconsistent XML namespaces, so namespace declarations are stripped
//! before parsing and all lookups use local element names.
//!
//! # Example (modern schema)
//!
//! ```xml
//! <PackageManifest Version="2.0.0" xmlns="http://schemas.example.com/2011">
//!   <Metadata>
//!     <Identity Id="MyExt.1fe95ai" Version="1.2" Publisher="Jane Doe" />
//!     <DisplayName>My Extension</DisplayName>
//!     <Description>Does things.</Description>
//!     <License>LICENSE.txt</License>
//!   </Metadata>
//!   <Installation InstalledByMsi="false" AllUsers="true">
//!     <InstallationTarget Id="Pro" Version="[12.0,14.0)" />
//!   </Installation>
//! </PackageManifest>
//! ```

use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::MANIFEST_FILENAME;
use crate::error::{Error, Result};
use crate::version::PackageVersion;

/// How to treat a required manifest field whose element or attribute is
/// absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Record a warning and leave the field unset. This matches the
    /// historical permissive behavior.
    #[default]
    Lenient,
    /// Fail the parse with a manifest error.
    Strict,
}

/// The two supported manifest schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// `Identity`-based schema with a `DisplayName` element.
    Modern,
    /// `Identifier`-based schema without a `DisplayName` element.
    Legacy,
}

impl ManifestFormat {
    /// Detect the schema of a parsed manifest document.
    ///
    /// A manifest containing a `DisplayName` element is always modern;
    /// one without it is always legacy, regardless of any namespace
    /// declarations present in the source.
    pub fn detect(doc: &Document<'_>) -> Self {
        if find_element(doc, "DisplayName").is_some() {
            ManifestFormat::Modern
        } else {
            ManifestFormat::Legacy
        }
    }

    fn field_map(self) -> &'static FieldMap {
        match self {
            ManifestFormat::Modern => &MODERN_MAP,
            ManifestFormat::Legacy => &LEGACY_MAP,
        }
    }
}

/// Where a package field comes from: an element's text, or a named
/// attribute on that element.
#[derive(Debug, Clone, Copy)]
struct Selector {
    element: &'static str,
    attribute: Option<&'static str>,
}

impl Selector {
    const fn text(element: &'static str) -> Self {
        Self {
            element,
            attribute: None,
        }
    }

    const fn attr(element: &'static str, attribute: &'static str) -> Self {
        Self {
            element,
            attribute: Some(attribute),
        }
    }
}

/// Per-format table mapping source elements to [`Package`] fields.
///
/// Detection picks one table and the parser applies it uniformly, so no
/// per-field format branching exists anywhere else.
struct FieldMap {
    id: Selector,
    name: Selector,
    description: Selector,
    version: Selector,
    author: Selector,
    tags: Option<Selector>,
    is_msi: Option<Selector>,
    all_users: Selector,
}

static MODERN_MAP: FieldMap = FieldMap {
    id: Selector::attr("Identity", "Id"),
    name: Selector::text("DisplayName"),
    description: Selector::text("Description"),
    version: Selector::attr("Identity", "Version"),
    author: Selector::attr("Identity", "Publisher"),
    tags: Some(Selector::text("Tags")),
    is_msi: Some(Selector::attr("Installation", "InstalledByMsi")),
    all_users: Selector::attr("Installation", "AllUsers"),
};

static LEGACY_MAP: FieldMap = FieldMap {
    id: Selector::attr("Identifier", "Id"),
    name: Selector::text("Name"),
    description: Selector::text("Description"),
    version: Selector::text("Version"),
    author: Selector::text("Author"),
    tags: None,
    is_msi: None,
    all_users: Selector::text("AllUsers"),
};

/// One parsed extension manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Unique package identifier. Non-empty for any successfully parsed
    /// package.
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Normalized dotted numeric version string.
    pub version: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub is_msi: bool,
    #[serde(default)]
    pub all_users: bool,
    /// Relative path to the package icon, if declared.
    #[serde(default)]
    pub icon: Option<String>,
    /// Relative path to the preview image, if declared.
    #[serde(default)]
    pub preview: Option<String>,
    /// Full license text, resolved from the manifest-declared license
    /// file when that file exists under the package directory.
    #[serde(default)]
    pub license: Option<String>,
    /// Distinct normalized supported versions, in first-seen order.
    #[serde(default)]
    pub supported_versions: Vec<String>,
    #[serde(default)]
    pub release_notes_url: Option<String>,
    #[serde(default)]
    pub getting_started_url: Option<String>,
    #[serde(default)]
    pub more_info_url: Option<String>,
    /// When this record was produced, not when the package was authored.
    pub date_published: DateTime<Utc>,
}

/// Parses `extension.vsixmanifest` files into [`Package`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestParser {
    strictness: Strictness,
}

impl ManifestParser {
    pub fn new(strictness: Strictness) -> Self {
        Self { strictness }
    }

    /// Locate, read, and parse the manifest inside an extracted package
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] for an unreadable file, malformed XML,
    /// a missing or empty package id, a malformed version string, or (in
    /// strict mode) any absent required field.
    pub fn parse_package(&self, package_dir: &Path) -> Result<Package> {
        let manifest_path = package_dir.join(MANIFEST_FILENAME);
        let raw = std::fs::read_to_string(&manifest_path)
            .map_err(|e| Error::manifest(&manifest_path, e.to_string()))?;

        let xml = strip_namespaces(&raw);
        let doc = Document::parse(&xml)
            .map_err(|e| Error::manifest(&manifest_path, format!("malformed XML: {e}")))?;

        let format = ManifestFormat::detect(&doc);
        tracing::debug!(manifest = %manifest_path.display(), ?format, "parsing manifest");
        let map = format.field_map();

        // The id is the catalog key, so it is mandatory even in lenient
        // mode.
        let id = match lookup(&doc, map.id) {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(Error::manifest(
                    &manifest_path,
                    format!(
                        "package id missing: element '{}' not found or empty",
                        map.id.element
                    ),
                ));
            }
        };

        let version = match self.required(&doc, map.version, &manifest_path, "version")? {
            Some(raw) => {
                let parsed = PackageVersion::parse(&raw)
                    .map_err(|e| Error::manifest(&manifest_path, e.to_string()))?;
                Some(parsed.to_string())
            }
            None => None,
        };

        let mut package = Package {
            id,
            name: self.required(&doc, map.name, &manifest_path, "name")?,
            description: self.required(&doc, map.description, &manifest_path, "description")?,
            version,
            author: self.required(&doc, map.author, &manifest_path, "author")?,
            tags: map.tags.and_then(|sel| lookup(&doc, sel)),
            is_msi: parse_bool(map.is_msi.and_then(|sel| lookup(&doc, sel))),
            all_users: parse_bool(lookup(&doc, map.all_users)),
            icon: lookup(&doc, Selector::text("Icon")),
            preview: lookup(&doc, Selector::text("PreviewImage")),
            license: None,
            supported_versions: supported_versions(&doc),
            release_notes_url: lookup(&doc, Selector::text("ReleaseNotes")),
            getting_started_url: lookup(&doc, Selector::text("GettingStartedGuide")),
            more_info_url: lookup(&doc, Selector::text("MoreInfo")),
            date_published: Utc::now(),
        };

        package.license = resolve_license(&doc, package_dir)?;

        Ok(package)
    }

    /// Look up a required field, applying the configured strictness when
    /// it is absent.
    fn required(
        &self,
        doc: &Document<'_>,
        selector: Selector,
        manifest_path: &Path,
        field: &str,
    ) -> Result<Option<String>> {
        match lookup(doc, selector) {
            Some(value) => Ok(Some(value)),
            None => match self.strictness {
                Strictness::Strict => Err(Error::manifest(
                    manifest_path,
                    format!(
                        "required field '{field}' not found on element '{}'",
                        selector.element
                    ),
                )),
                Strictness::Lenient => {
                    tracing::warn!(
                        manifest = %manifest_path.display(),
                        field,
                        element = selector.element,
                        "required field missing, leaving unset"
                    );
                    Ok(None)
                }
            },
        }
    }
}

/// Remove XML namespace declarations so lookups can use local names.
fn strip_namespaces(xml: &str) -> String {
    static XMLNS: OnceLock<Regex> = OnceLock::new();
    let re = XMLNS.get_or_init(|| {
        Regex::new(r#" xmlns(:\w+)?="[^"]*""#).expect("namespace pattern is valid")
    });
    re.replace_all(xml, "").into_owned()
}

/// First element in document order with the given local tag name.
fn find_element<'a, 'input>(
    doc: &'a Document<'input>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    doc.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// Resolve a selector against the document: the named attribute when one
/// is configured, the element's text content otherwise. Empty results are
/// treated as absent.
fn lookup(doc: &Document<'_>, selector: Selector) -> Option<String> {
    let node = find_element(doc, selector.element)?;
    let value = match selector.attribute {
        Some(attr) => node.attribute(attr).map(str::to_string),
        None => element_text(node),
    }?;
    let value = value.trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

/// Concatenated text of an element and its descendants.
fn element_text(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    if text.is_empty() { None } else { Some(text) }
}

/// `true` only for a case-insensitive `"true"`; absent values are false.
fn parse_bool(value: Option<String>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Collect the distinct supported versions declared across all
/// installation-target version ranges, preserving first-seen order.
///
/// Each range attribute is trimmed of interval brackets and split on
/// commas; tokens that do not parse as versions are skipped.
fn supported_versions(doc: &Document<'_>) -> Vec<String> {
    let mut targets: Vec<Node<'_, '_>> = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "InstallationTarget")
        .collect();
    if targets.is_empty() {
        // Legacy manifests declare targets as VisualStudio elements.
        targets = doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "VisualStudio")
            .collect();
    }

    let mut versions: Vec<String> = Vec::new();
    for target in targets {
        let Some(range) = target.attribute("Version") else {
            continue;
        };
        let raw = range.trim_matches(['[', '(', ']', ')']);
        for token in raw.split(',') {
            let Ok(version) = PackageVersion::parse(token) else {
                continue;
            };
            let canonical = version.to_string();
            if !versions.contains(&canonical) {
                versions.push(canonical);
            }
        }
    }
    versions
}

/// Load the full text of the manifest-declared license file, when that
/// file exists under the package directory. A missing declaration or a
/// missing file is not an error.
fn resolve_license(doc: &Document<'_>, package_dir: &Path) -> Result<Option<String>> {
    let Some(relative) = lookup(doc, Selector::text("License")) else {
        return Ok(None);
    };
    let path = package_dir.join(relative);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(std::fs::read_to_string(path)?))
}
