use crate::Result;
use glob::{MatchOptions, Pattern};
use std::path::Path;

const DEFAULT_DIRECTORIES: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "bower_components",
    "__MACOSX",
];

const DEFAULT_FILE_PATTERNS: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "*.map",
    "LICENSE*",
    "LICENCE*",
    "README*",
    "CHANGELOG*",
    "*.md",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Which files are left out of a bundle.
///
/// Matching is by name only and applies at any depth: a path is excluded when
/// any of its directory components equals an excluded directory name, or when
/// its file name matches one of the glob patterns (which covers suffix rules
/// such as `*.map`).
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    directories: Vec<String>,
    file_patterns: Vec<Pattern>,
}

impl ExclusionPolicy {
    /// A policy that excludes nothing
    pub fn empty() -> Self {
        Self {
            directories: Vec::new(),
            file_patterns: Vec::new(),
        }
    }

    pub fn with_directory(mut self, name: impl Into<String>) -> Self {
        self.directories.push(name.into());
        self
    }

    /// Add a file-name glob such as `*.psd` or `notes.txt`
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.file_patterns.push(Pattern::new(pattern)?);
        Ok(self)
    }

    pub fn excludes_directory(&self, name: &str) -> bool {
        self.directories.iter().any(|dir| dir.eq_ignore_ascii_case(name))
    }

    pub fn excludes_file(&self, name: &str) -> bool {
        self.file_patterns
            .iter()
            .any(|pattern| pattern.matches_with(name, MATCH_OPTIONS))
    }

    /// Decide for a path relative to the extension root
    pub fn excludes(&self, relative: &Path) -> bool {
        let components: Vec<&str> = relative
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();

        let Some((file_name, parents)) = components.split_last() else {
            return false;
        };

        parents.iter().any(|dir| self.excludes_directory(dir)) || self.excludes_file(file_name)
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        let file_patterns = DEFAULT_FILE_PATTERNS
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .collect();

        Self {
            directories: DEFAULT_DIRECTORIES.iter().map(|d| d.to_string()).collect(),
            file_patterns,
        }
    }
}
