use super::MANIFEST_FILE;
use super::locale::resolve_message;
use crate::ValidationError;
use crate::pack::{ExtensionDescriptor, ExtensionSource};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// True when `path` is a directory with a regular manifest file at its root
pub fn is_extension_directory(path: &Path) -> bool {
    path.join(MANIFEST_FILE).is_file()
}

/// Find the shallowest directory under `dir` (including `dir` itself) that
/// holds a manifest, looking at most `max_depth` levels down.
pub fn locate_root(dir: &Path, max_depth: usize) -> Option<PathBuf> {
    for depth in 0..=max_depth {
        let found = WalkDir::new(dir)
            .min_depth(depth)
            .max_depth(depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .find(|entry| entry.file_type().is_dir() && is_extension_directory(entry.path()));

        if let Some(entry) = found {
            return Some(entry.into_path());
        }
    }
    None
}

/// Check that `dir` holds a well-formed extension and describe it.
///
/// Every schema problem in the manifest is reported, not just the first.
pub fn validate(dir: &Path) -> Result<ExtensionDescriptor, ValidationError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Err(ValidationError::ManifestMissing(dir.to_path_buf()));
    }

    let content = std::fs::read_to_string(&manifest_path).map_err(|source| {
        ValidationError::Unreadable {
            path: manifest_path.clone(),
            source,
        }
    })?;

    // Chrome tolerates a UTF-8 BOM on manifests
    let manifest: Value = serde_json::from_str(content.trim_start_matches('\u{feff}'))
        .map_err(|source| ValidationError::ManifestMalformed {
            path: manifest_path.clone(),
            source,
        })?;

    let Some(fields) = manifest.as_object() else {
        return Err(ValidationError::SchemaInvalid {
            path: manifest_path,
            violations: vec!["manifest must be a JSON object".to_string()],
        });
    };

    let mut violations = Vec::new();

    let name = fields.get("name").and_then(Value::as_str);
    if name.is_none() {
        violations.push(describe_string_problem(fields.get("name"), "name"));
    }

    let version = fields.get("version").and_then(Value::as_str);
    if version.is_none() {
        violations.push(describe_string_problem(fields.get("version"), "version"));
    }

    let manifest_version = match fields.get("manifest_version") {
        None => {
            violations.push("'manifest_version' is required".to_string());
            None
        }
        Some(value) => match value
            .as_u64()
            .filter(|v| *v > 0)
            .and_then(|v| u32::try_from(v).ok()) {
            Some(v) => Some(v),
            None => {
                violations.push("'manifest_version' must be a positive integer".to_string());
                None
            }
        },
    };

    if !violations.is_empty() {
        return Err(ValidationError::SchemaInvalid {
            path: manifest_path,
            violations,
        });
    }

    let default_locale = fields.get("default_locale").and_then(Value::as_str);
    let resolved_name = resolve_message(dir, name.unwrap_or_default(), default_locale);
    let description = fields
        .get("description")
        .and_then(Value::as_str)
        .map(|text| resolve_message(dir, text, default_locale));

    let permissions: BTreeSet<String> = ["permissions", "host_permissions"]
        .iter()
        .filter_map(|key| fields.get(*key).and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();

    let icons = fields.get("icons").and_then(Value::as_object).map(|icons| {
        icons
            .iter()
            .filter_map(|(size, path)| Some((size.clone(), path.as_str()?.to_string())))
            .collect::<BTreeMap<_, _>>()
    });

    let path = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());

    tracing::debug!(
        "Validated extension '{}' ({}) at {}",
        resolved_name,
        version.unwrap_or_default(),
        path.display()
    );

    let mut descriptor = ExtensionDescriptor::new(resolved_name, ExtensionSource::Local { path });
    descriptor.version = version.map(str::to_string);
    descriptor.description = description;
    descriptor.manifest_version = manifest_version;
    descriptor.permissions = permissions;
    descriptor.icons = icons;

    Ok(descriptor)
}

fn describe_string_problem(value: Option<&Value>, field: &str) -> String {
    match value {
        None => format!("'{}' is required", field),
        Some(_) => format!("'{}' must be a string", field),
    }
}
