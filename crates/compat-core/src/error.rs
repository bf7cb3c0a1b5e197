use std::path::PathBuf;

/// Errors that can occur in the ingestion and analysis pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required root directory does not exist. Fatal: aborts the run
    /// before any extraction is attempted.
    #[error("required directory does not exist: {path}")]
    Configuration { path: PathBuf },

    /// An archive could not be unpacked. The affected package is skipped
    /// and the run continues.
    #[error("failed to extract archive {archive}: {reason}")]
    Extraction { archive: PathBuf, reason: String },

    /// A manifest could not be parsed. The affected package is skipped
    /// from the catalog and the run continues.
    #[error("failed to parse manifest at {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    /// The module inspector failed for one extension directory. That
    /// extension's classification is skipped and the run continues.
    #[error("failed to inspect binaries under {dir}: {reason}")]
    Inspection { dir: PathBuf, reason: String },

    /// A version string could not be parsed as a dotted numeric version.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// I/O error reading or writing package files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map each error kind to a distinct process exit code.
    ///
    /// `0` is reserved for a completed run.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Configuration { .. } => 2,
            Error::Extraction { .. } => 3,
            Error::Manifest { .. } | Error::InvalidVersion { .. } => 4,
            Error::Inspection { .. } => 5,
            Error::Io(_) => 1,
        }
    }

    /// Convenience constructor for manifest failures.
    pub fn manifest(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Manifest {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            Error::Configuration {
                path: PathBuf::from("/missing"),
            },
            Error::Extraction {
                archive: PathBuf::from("a.vsix"),
                reason: "corrupt".to_string(),
            },
            Error::manifest("m.vsixmanifest", "bad xml"),
            Error::Inspection {
                dir: PathBuf::from("ext"),
                reason: "unreadable".to_string(),
            },
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn test_display_names_offending_file() {
        let err = Error::Extraction {
            archive: PathBuf::from("broken.vsix"),
            reason: "not a zip".to_string(),
        };
        assert!(format!("{err}").contains("broken.vsix"));
    }
}
