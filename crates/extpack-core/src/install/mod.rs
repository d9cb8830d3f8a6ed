//! Turning a pack into loaded extensions.

mod collaborators;
mod installer;
mod resolver;

pub use collaborators::{
    BrowserHandle, BrowserRelauncher, FetchError, LaunchOptions, PackRecorder, RelaunchOutcome,
    ReleaseFetcher,
};
pub use installer::{InstallOutcome, InstallResult, Installer};
pub(crate) use resolver::slug;
pub use resolver::{
    ManualInstall, ProgressEvent, ResolutionFailure, ResolutionReport, ResolvedExtension, Resolver,
};
