use super::exclude::ExclusionPolicy;
use crate::extension;
use crate::pack::{BundledFiles, ExtensionDescriptor, ExtensionSource};
use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Embed every file of an extension directory into a `bundled` descriptor.
///
/// The directory must validate as an extension. Any file that cannot be read
/// aborts the whole bundle; nothing is skipped silently.
pub fn bundle(dir: &Path, policy: &ExclusionPolicy) -> Result<ExtensionDescriptor> {
    tracing::debug!("Bundling extension at {}", dir.display());

    let mut descriptor = extension::validate(dir)?;
    let mut files = BundledFiles::new();

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !(entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| policy.excludes_directory(name)))
        });

    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            Error::io(path, err.into())
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };

        if policy.excludes(relative) {
            tracing::debug!("Excluded from bundle: {}", relative.display());
            continue;
        }

        let key = bundle_key(relative).ok_or_else(|| {
            Error::io(
                entry.path(),
                std::io::Error::new(std::io::ErrorKind::InvalidData, "path is not valid UTF-8"),
            )
        })?;
        // extract must be able to read back every key written here
        if safe_relative_path(&key).is_none() {
            return Err(Error::io(
                entry.path(),
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "file name cannot be stored in a bundle",
                ),
            ));
        }

        let bytes = std::fs::read(entry.path()).map_err(|e| Error::io(entry.path(), e))?;
        let encoded = encode_blob(&bytes).map_err(|e| Error::io(entry.path(), e))?;
        files.insert(key, encoded);
    }

    tracing::info!(
        "Bundled '{}' ({} file(s), {} encoded bytes)",
        descriptor.name,
        files.len(),
        files.encoded_size()
    );

    descriptor.source = ExtensionSource::Bundled { files };
    Ok(descriptor)
}

/// Materialise a bundled descriptor under `target`, returning `target`.
///
/// Entries are independent and may be written in any order. On failure the
/// files already written are left in place; treat the directory as unusable.
pub fn extract(descriptor: &ExtensionDescriptor, target: &Path) -> Result<PathBuf> {
    let ExtensionSource::Bundled { files } = &descriptor.source else {
        return Err(Error::CorruptBundle {
            entry: descriptor.name.clone(),
            reason: format!("'{}' is a {} entry, not bundled", descriptor.name, descriptor.kind()),
        });
    };

    tracing::debug!(
        "Extracting {} file(s) of '{}' to {}",
        files.len(),
        descriptor.name,
        target.display()
    );

    std::fs::create_dir_all(target).map_err(|e| Error::io(target, e))?;

    for (key, blob) in files.iter() {
        let relative = safe_relative_path(key).ok_or_else(|| Error::CorruptBundle {
            entry: key.to_string(),
            reason: "path escapes the extension directory".to_string(),
        })?;

        let bytes = decode_blob(blob).map_err(|reason| Error::CorruptBundle {
            entry: key.to_string(),
            reason,
        })?;

        let destination = target.join(relative);
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(&destination, bytes).map_err(|e| Error::io(&destination, e))?;
    }

    Ok(target.to_path_buf())
}

/// Encoded size of a bundled descriptor, for display
pub fn size(descriptor: &ExtensionDescriptor) -> usize {
    descriptor.bundle_size()
}

fn encode_blob(bytes: &[u8]) -> std::io::Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

fn decode_blob(blob: &str) -> std::result::Result<Vec<u8>, String> {
    let compressed = STANDARD
        .decode(blob.trim())
        .map_err(|e| format!("invalid base64: {}", e))?;

    let mut bytes = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut bytes)
        .map_err(|e| format!("invalid gzip data: {}", e))?;

    Ok(bytes)
}

/// `/`-separated key for a relative path, independent of the host separator
fn bundle_key(relative: &Path) -> Option<String> {
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

fn safe_relative_path(key: &str) -> Option<PathBuf> {
    if key.is_empty() || key.contains('\\') {
        return None;
    }

    let path = Path::new(key);
    let only_normal = path
        .components()
        .all(|component| matches!(component, Component::Normal(_)));

    if only_normal && key.split('/').all(|segment| !segment.is_empty()) {
        Some(path.to_path_buf())
    } else {
        None
    }
}
