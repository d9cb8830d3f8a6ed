use crate::{Error, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "extpack";

/// Filesystem locations used by the installer and registry.
///
/// Passed explicitly to everything that touches disk so callers (and tests)
/// decide where caches and records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    cache_dir: PathBuf,
    data_dir: PathBuf,
}

impl Settings {
    /// Resolve settings from an optional home override, falling back to the
    /// platform cache and data directories.
    pub fn resolve(home: Option<PathBuf>) -> Result<Self> {
        if let Some(home) = home {
            return Ok(Self::rooted(home));
        }

        let cache_dir = dirs::cache_dir()
            .ok_or(Error::NoDirectory("cache"))?
            .join(APP_DIR);
        let data_dir = dirs::data_dir()
            .ok_or(Error::NoDirectory("data"))?
            .join(APP_DIR);

        Ok(Self {
            cache_dir,
            data_dir,
        })
    }

    /// Keep everything under a single root directory
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            cache_dir: root.join("cache"),
            data_dir: root.join("data"),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Where bundled extensions are unpacked before loading
    pub fn bundled_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("bundled")
    }

    /// Where GitHub release downloads are kept, keyed by owner/repo/tag
    pub fn github_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("github")
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.data_dir.join("profiles")
    }

    pub fn registry_file(&self) -> PathBuf {
        self.data_dir.join("installed.json")
    }
}
