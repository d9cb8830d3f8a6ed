//! Record of installed packs, stored as JSON in the data directory.

use crate::install::PackRecorder;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionStatus {
    Loaded,
    ManualInstall,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledExtension {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub status: ExtensionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackRecord {
    pub name: String,
    pub version: String,
    /// Pack file path or share link the pack was installed from
    pub source: String,
    pub installed_at: String,
    pub extensions: Vec<InstalledExtension>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    packs: Vec<InstalledPackRecord>,
}

/// JSON-backed list of installed packs, one record per pack name
pub struct InstalledPacks {
    path: PathBuf,
}

impl InstalledPacks {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, oldest install first. A missing file means no records.
    pub fn load(&self) -> Result<Vec<InstalledPackRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let file: RegistryFile = serde_json::from_str(&content)?;
        Ok(file.packs)
    }

    /// Insert or replace the record with the same pack name
    pub fn upsert(&self, record: &InstalledPackRecord) -> Result<()> {
        let mut packs = self.load()?;
        packs.retain(|existing| existing.name != record.name);
        packs.push(record.clone());
        self.save(packs)
    }

    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut packs = self.load()?;
        let before = packs.len();
        packs.retain(|existing| existing.name != name);
        let removed = packs.len() != before;
        if removed {
            self.save(packs)?;
        }
        Ok(removed)
    }

    fn save(&self, packs: Vec<InstalledPackRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&RegistryFile { packs })?;

        // write-then-rename so readers never see a half-written file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| Error::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| Error::io(&self.path, e))?;

        tracing::debug!("Saved installed-pack registry to {}", self.path.display());
        Ok(())
    }
}

impl PackRecorder for InstalledPacks {
    fn record(&self, record: &InstalledPackRecord) -> Result<()> {
        self.upsert(record)
    }
}
