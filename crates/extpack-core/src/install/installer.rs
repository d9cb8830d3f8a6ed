use super::collaborators::{
    BrowserHandle, BrowserRelauncher, LaunchOptions, PackRecorder, RelaunchOutcome,
    ReleaseFetcher,
};
use super::resolver::{ProgressEvent, ResolutionReport, Resolver};
use crate::pack::{Pack, PackReader};
use crate::registry::{ExtensionStatus, InstalledExtension, InstalledPackRecord};
use crate::{Result, Settings};
use serde::Serialize;
use std::path::Path;

/// Overall result of an install
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstallOutcome {
    Launched { pid: u32 },
    /// Nothing resolved to a directory; the browser was not touched
    NoExtensions,
    BrowserRunning,
    KillFailed,
    LaunchFailed { message: String },
}

impl InstallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InstallOutcome::Launched { .. })
    }

    /// Short remediation hint for failed outcomes
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            InstallOutcome::Launched { .. } => None,
            InstallOutcome::NoExtensions => {
                Some("no extension could be prepared; fix the errors above or install store extensions manually")
            }
            InstallOutcome::BrowserRunning => Some("close the browser and retry"),
            InstallOutcome::KillFailed => Some("close the browser manually and retry"),
            InstallOutcome::LaunchFailed { .. } => {
                Some("check that --browser-path points at a Chromium-based browser")
            }
        }
    }
}

impl From<RelaunchOutcome> for InstallOutcome {
    fn from(outcome: RelaunchOutcome) -> Self {
        match outcome {
            RelaunchOutcome::Launched { pid } => InstallOutcome::Launched { pid },
            RelaunchOutcome::BrowserRunning => InstallOutcome::BrowserRunning,
            RelaunchOutcome::KillFailed => InstallOutcome::KillFailed,
            RelaunchOutcome::LaunchFailed { message } => InstallOutcome::LaunchFailed { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallResult {
    pub pack: String,
    #[serde(flatten)]
    pub outcome: InstallOutcome,
    pub report: ResolutionReport,
}

impl InstallResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Reads a pack, resolves its entries and relaunches the browser with them
pub struct Installer<'a> {
    settings: &'a Settings,
    fetcher: &'a dyn ReleaseFetcher,
    browser: &'a dyn BrowserRelauncher,
    recorder: &'a dyn PackRecorder,
}

impl<'a> Installer<'a> {
    pub fn new(
        settings: &'a Settings,
        fetcher: &'a dyn ReleaseFetcher,
        browser: &'a dyn BrowserRelauncher,
        recorder: &'a dyn PackRecorder,
    ) -> Self {
        Self {
            settings,
            fetcher,
            browser,
            recorder,
        }
    }

    /// Install the pack stored at `pack_path`
    pub fn install(
        &self,
        pack_path: &Path,
        browser: &BrowserHandle,
        options: &LaunchOptions,
        on_progress: &mut dyn FnMut(ProgressEvent<'_>),
    ) -> Result<InstallResult> {
        let pack = PackReader::from_file(pack_path)?;
        Ok(self.install_pack(
            &pack,
            &pack_path.display().to_string(),
            browser,
            options,
            on_progress,
        ))
    }

    /// Install an already-validated pack; `source` is recorded as its origin
    pub fn install_pack(
        &self,
        pack: &Pack,
        source: &str,
        browser: &BrowserHandle,
        options: &LaunchOptions,
        on_progress: &mut dyn FnMut(ProgressEvent<'_>),
    ) -> InstallResult {
        let report = Resolver::new(self.settings, self.fetcher).resolve(pack, on_progress);
        let directories = report.directories();

        if directories.is_empty() {
            tracing::warn!("Pack '{}' has no installable extensions", pack.name);
            return InstallResult {
                pack: pack.name.clone(),
                outcome: InstallOutcome::NoExtensions,
                report,
            };
        }

        tracing::info!(
            "Relaunching {} with {} extension(s)",
            browser.name,
            directories.len()
        );
        let outcome: InstallOutcome = self.browser.relaunch(browser, &directories, options).into();

        if outcome.is_success() {
            let record = record_for(pack, source, &report);
            if let Err(e) = self.recorder.record(&record) {
                tracing::warn!("Installed, but could not record pack '{}': {}", pack.name, e);
            }
        }

        InstallResult {
            pack: pack.name.clone(),
            outcome,
            report,
        }
    }
}

fn record_for(pack: &Pack, source: &str, report: &ResolutionReport) -> InstalledPackRecord {
    let mut extensions: Vec<(usize, InstalledExtension)> = Vec::new();

    extensions.extend(report.ready.iter().map(|r| {
        (
            r.index,
            InstalledExtension {
                name: r.name.clone(),
                path: Some(r.path.clone()),
                status: ExtensionStatus::Loaded,
            },
        )
    }));
    extensions.extend(report.manual.iter().map(|m| {
        (
            m.index,
            InstalledExtension {
                name: m.name.clone(),
                path: None,
                status: ExtensionStatus::ManualInstall,
            },
        )
    }));
    extensions.extend(report.errors.iter().map(|f| {
        (
            f.index,
            InstalledExtension {
                name: f.name.clone(),
                path: None,
                status: ExtensionStatus::Failed,
            },
        )
    }));
    extensions.sort_by_key(|(index, _)| *index);

    InstalledPackRecord {
        name: pack.name.clone(),
        version: pack.version.clone(),
        source: source.to_string(),
        installed_at: chrono::Utc::now().to_rfc3339(),
        extensions: extensions.into_iter().map(|(_, e)| e).collect(),
    }
}
