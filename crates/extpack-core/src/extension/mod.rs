//! Recognising extension directories and reading their manifests.

mod locale;
mod scanner;
mod validator;

pub use locale::resolve_message;
pub use scanner::{ScanError, ScanOptions, ScanResult, scan};
pub use validator::{is_extension_directory, locate_root, validate};

/// Manifest file expected at the root of every extension
pub const MANIFEST_FILE: &str = "manifest.json";
