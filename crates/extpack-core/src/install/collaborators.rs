//! Contracts the orchestrator needs from the outside world.
//!
//! Implementations live in other crates (network fetching, browser process
//! control); tests provide their own fakes.

use crate::Result;
use crate::pack::RepoRef;
use crate::registry::InstalledPackRecord;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a remote release could not be fetched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Release not found: {0}")]
    NotFound(String),

    #[error("GitHub API rate limit exceeded")]
    RateLimited { reset_at: Option<String> },

    #[error("Network unreachable: {0}")]
    Unreachable(String),

    #[error("Fetch failed: {0}")]
    Failed(String),
}

impl FetchError {
    pub fn hint(&self) -> Option<String> {
        match self {
            FetchError::NotFound(_) => {
                Some("check the repository name and release tag".to_string())
            }
            FetchError::RateLimited { reset_at } => Some(match reset_at {
                Some(reset) => format!("set GITHUB_TOKEN or retry after {}", reset),
                None => "set GITHUB_TOKEN to raise the rate limit".to_string(),
            }),
            FetchError::Unreachable(_) => Some("check your network connection".to_string()),
            FetchError::Failed(_) => None,
        }
    }
}

/// Downloads GitHub releases
pub trait ReleaseFetcher {
    /// Fetch `repo` at `tag` (latest release when `None`) into `dest`.
    ///
    /// Returns the directory inside `dest` that holds the manifest.
    /// `progress` receives download fractions in `0.0..=1.0`.
    fn fetch(
        &self,
        repo: &RepoRef,
        tag: Option<&str>,
        dest: &Path,
        progress: &mut dyn FnMut(f64),
    ) -> std::result::Result<PathBuf, FetchError>;
}

/// The browser an install targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserHandle {
    pub name: String,
    pub executable: PathBuf,
    /// Process name used to detect and stop running instances
    pub process_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Stop a running instance first; otherwise report `BrowserRunning`
    pub kill_running: bool,
    pub profile_dir: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            kill_running: true,
            profile_dir: None,
            extra_args: Vec::new(),
        }
    }
}

/// Result of asking the browser collaborator to relaunch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RelaunchOutcome {
    Launched { pid: u32 },
    BrowserRunning,
    KillFailed,
    LaunchFailed { message: String },
}

/// Stops a running browser if needed and starts it with extensions loaded
pub trait BrowserRelauncher {
    fn relaunch(
        &self,
        browser: &BrowserHandle,
        extension_dirs: &[PathBuf],
        options: &LaunchOptions,
    ) -> RelaunchOutcome;
}

/// Persists a record of each successful install
pub trait PackRecorder {
    fn record(&self, record: &InstalledPackRecord) -> Result<()>;
}
