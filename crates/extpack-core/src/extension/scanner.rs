use super::validator::{is_extension_directory, validate};
use crate::pack::ExtensionDescriptor;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Controls how deep and where [`scan`] looks for extensions
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub max_depth: usize,
    /// Directory names never descended into
    pub skip_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            skip_dirs: [".git", ".svn", ".hg", "node_modules", "bower_components", "target"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScanError {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub extensions: Vec<ExtensionDescriptor>,
    pub errors: Vec<ScanError>,
}

/// Find every extension under `root`.
///
/// Once a directory with a manifest is found its subdirectories are not
/// scanned; an extension's own folders are never treated as siblings.
/// Directories whose manifest fails validation are reported in `errors`.
pub fn scan(root: &Path, options: &ScanOptions) -> ScanResult {
    tracing::debug!("Scanning {} for extensions (depth {})", root.display(), options.max_depth);

    let mut result = ScanResult::default();
    let mut walker = WalkDir::new(root)
        .max_depth(options.max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry, options));

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                result.errors.push(ScanError {
                    path: err.path().unwrap_or(root).to_path_buf(),
                    message: err.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_dir() || !is_extension_directory(entry.path()) {
            continue;
        }

        match validate(entry.path()) {
            Ok(descriptor) => {
                tracing::debug!("Found extension '{}' at {}", descriptor.name, entry.path().display());
                result.extensions.push(descriptor);
            }
            Err(err) => result.errors.push(ScanError {
                path: entry.path().to_path_buf(),
                message: err.to_string(),
            }),
        }

        walker.skip_current_dir();
    }

    tracing::info!(
        "Scan of {} found {} extension(s), {} problem(s)",
        root.display(),
        result.extensions.len(),
        result.errors.len()
    );

    result
}

fn is_skipped(entry: &DirEntry, options: &ScanOptions) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| options.skip_dirs.iter().any(|skip| skip == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::MANIFEST_FILE;
    use std::fs;

    const VALID: &str = r#"{"manifest_version": 3, "name": "N", "version": "1.0"}"#;

    fn make_extension(dir: &Path, manifest: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
    }

    #[test]
    fn test_scan_finds_extensions_and_reports_invalid_ones() {
        let root = tempfile::tempdir().unwrap();
        make_extension(&root.path().join("alpha"), VALID);
        make_extension(&root.path().join("group").join("beta"), VALID);
        make_extension(&root.path().join("broken"), "{}");

        let result = scan(root.path(), &ScanOptions::default());

        assert_eq!(result.extensions.len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].path.ends_with("broken"));
    }

    #[test]
    fn test_scan_does_not_descend_into_extensions() {
        let root = tempfile::tempdir().unwrap();
        let outer = root.path().join("outer");
        make_extension(&outer, VALID);
        make_extension(&outer.join("vendor").join("inner"), VALID);

        let result = scan(root.path(), &ScanOptions::default());
        assert_eq!(result.extensions.len(), 1);
    }

    #[test]
    fn test_scan_skips_excluded_dirs_and_respects_depth() {
        let root = tempfile::tempdir().unwrap();
        make_extension(&root.path().join("node_modules").join("pkg"), VALID);
        make_extension(&root.path().join("a").join("b").join("c").join("deep"), VALID);

        let result = scan(root.path(), &ScanOptions::default());
        assert!(result.extensions.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_scan_root_itself_can_be_an_extension() {
        let root = tempfile::tempdir().unwrap();
        make_extension(root.path(), VALID);

        let result = scan(root.path(), &ScanOptions::default());
        assert_eq!(result.extensions.len(), 1);
    }
}
