use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single schema violation found while validating a pack document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Violation {
    /// Location inside the document, e.g. `extensions[2].repo`
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Errors raised while checking that a directory holds a usable extension.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("No manifest.json found in {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("Failed to parse manifest at {}: {source}", .path.display())]
    ManifestMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid manifest at {}: {}", .path.display(), .violations.join("; "))]
    SchemaInvalid {
        path: PathBuf,
        violations: Vec<String>,
    },

    #[error("Failed to read manifest at {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid extension: {0}")]
    InvalidExtension(#[from] ValidationError),

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt bundle entry '{entry}': {reason}")]
    CorruptBundle { entry: String, reason: String },

    #[error("Invalid pack file ({} problem(s)): {}", .violations.len(), join_violations(.violations))]
    InvalidPackFile { violations: Vec<Violation> },

    #[error("Unknown pack schema version: {0}")]
    UnknownSchemaVersion(u64),

    #[error("Failed to parse pack: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid exclusion pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Could not determine {0} directory")]
    NoDirectory(&'static str),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
