mod error;
mod finder;
mod launcher;
mod process;
mod profile;

pub use error::{Error, Result};
pub use finder::{BrowserFinder, BrowserKind};
pub use launcher::BrowserLauncher;
pub use process::{ProcessControl, SystemProcesses};
pub use profile::ProfileManager;
