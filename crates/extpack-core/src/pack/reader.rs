use super::schema;
use super::types::{LEGACY_SCHEMA_VERSION, Pack};
use crate::{Error, Result};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct PackReader;

impl PackReader {
    /// Read, validate and (if needed) upgrade a pack file.
    ///
    /// Callers always receive a pack at the current schema version.
    pub fn from_file(path: &Path) -> Result<Pack> {
        tracing::debug!("Reading pack file from: {}", path.display());

        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let document: Value = serde_json::from_reader(BufReader::new(file))?;
        let pack = Self::from_document(document)?;

        tracing::info!(
            "Loaded pack '{}' with {} extension(s) from {}",
            pack.name,
            pack.extensions.len(),
            path.display()
        );

        Ok(pack)
    }

    /// Parse a pack from a JSON string
    pub fn from_str(content: &str) -> Result<Pack> {
        let document: Value = serde_json::from_str(content)?;
        Self::from_document(document)
    }

    /// Validate an already-parsed document and convert it into a [`Pack`]
    pub fn from_document(document: Value) -> Result<Pack> {
        let violations = schema::validate_document(&document);
        if !violations.is_empty() {
            tracing::debug!("Pack document has {} violation(s)", violations.len());
            return Err(Error::InvalidPackFile { violations });
        }

        let pack: Pack = serde_json::from_value(document)?;

        if pack.v == LEGACY_SCHEMA_VERSION {
            return schema::upgrade(pack);
        }

        Ok(pack)
    }
}
