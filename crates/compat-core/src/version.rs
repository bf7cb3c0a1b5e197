//! Dotted numeric version parsing and normalization.
//!
//! Manifest versions carry up to four numeric components
//! (`major.minor.build.revision`). Missing components are treated as zero,
//! so `"1.2"` and `"1.2.0.0"` compare equal and normalize to the same
//! canonical string. Semver cannot represent four components, hence the
//! dedicated type.
//!
//! # Examples
//!
//! ```
//! use compat_core::version::PackageVersion;
//!
//! let a = PackageVersion::parse("1.2").unwrap();
//! let b = PackageVersion::parse("1.2.0.0").unwrap();
//! assert_eq!(a, b);
//! assert_eq!(a.to_string(), "1.2");
//! assert_eq!(b.to_string(), "1.2");
//! ```

use crate::error::{Error, Result};

/// A normalized four-component package version.
///
/// Ordering and equality operate on the zero-filled components, so the
/// textual precision of the input does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageVersion {
    components: [u64; 4],
}

impl PackageVersion {
    /// Parse a dotted numeric version string.
    ///
    /// Accepts two to four dot-separated numeric components. Surrounding
    /// whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] for empty input, non-numeric
    /// components, fewer than two or more than four components.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidVersion {
                version: input.to_string(),
                reason: "empty version string".to_string(),
            });
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() < 2 || parts.len() > 4 {
            return Err(Error::InvalidVersion {
                version: input.to_string(),
                reason: format!("expected 2 to 4 components, found {}", parts.len()),
            });
        }

        let mut components = [0u64; 4];
        for (i, part) in parts.iter().enumerate() {
            components[i] = part.parse().map_err(|_| Error::InvalidVersion {
                version: input.to_string(),
                reason: format!("component '{part}' is not numeric"),
            })?;
        }

        Ok(Self { components })
    }

    /// The four zero-filled components (major, minor, build, revision).
    pub fn components(&self) -> [u64; 4] {
        self.components
    }
}

impl std::fmt::Display for PackageVersion {
    /// Canonical form: trailing zero components are trimmed, but at least
    /// `major.minor` is always printed.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last = self
            .components
            .iter()
            .rposition(|&c| c != 0)
            .unwrap_or(0)
            .max(1);
        let rendered: Vec<String> = self.components[..=last]
            .iter()
            .map(|c| c.to_string())
            .collect();
        f.write_str(&rendered.join("."))
    }
}
