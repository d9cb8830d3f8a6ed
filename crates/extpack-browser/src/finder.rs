use crate::{Error, Result};
use extpack_core::install::BrowserHandle;
use std::path::{Path, PathBuf};

/// Chromium-based browsers that accept `--load-extension`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    Chrome,
    Chromium,
    Brave,
    Edge,
}

impl BrowserKind {
    /// Search order when no browser is named explicitly
    pub const ALL: [BrowserKind; 4] = [
        BrowserKind::Chrome,
        BrowserKind::Chromium,
        BrowserKind::Brave,
        BrowserKind::Edge,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "Google Chrome",
            BrowserKind::Chromium => "Chromium",
            BrowserKind::Brave => "Brave",
            BrowserKind::Edge => "Microsoft Edge",
        }
    }

    /// Name of the running process, as matched by pgrep/tasklist
    pub fn process_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return match self {
            BrowserKind::Chrome => "Google Chrome",
            BrowserKind::Chromium => "Chromium",
            BrowserKind::Brave => "Brave Browser",
            BrowserKind::Edge => "Microsoft Edge",
        };

        #[cfg(target_os = "windows")]
        return match self {
            BrowserKind::Chrome => "chrome.exe",
            BrowserKind::Chromium => "chromium.exe",
            BrowserKind::Brave => "brave.exe",
            BrowserKind::Edge => "msedge.exe",
        };

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        return match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Chromium => "chromium",
            BrowserKind::Brave => "brave",
            BrowserKind::Edge => "msedge",
        };
    }

    /// Executable names looked up on PATH
    fn commands(&self) -> &'static [&'static str] {
        match self {
            BrowserKind::Chrome => &["google-chrome", "google-chrome-stable", "chrome"],
            BrowserKind::Chromium => &["chromium", "chromium-browser"],
            BrowserKind::Brave => &["brave-browser", "brave"],
            BrowserKind::Edge => &["microsoft-edge", "microsoft-edge-stable", "msedge"],
        }
    }

    /// Platform-specific install locations
    fn default_paths(&self) -> Vec<PathBuf> {
        #[cfg(target_os = "macos")]
        return vec![PathBuf::from(match self {
            BrowserKind::Chrome => "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            BrowserKind::Chromium => "/Applications/Chromium.app/Contents/MacOS/Chromium",
            BrowserKind::Brave => "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
            BrowserKind::Edge => "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        })];

        #[cfg(target_os = "linux")]
        return match self {
            BrowserKind::Chrome => vec![
                PathBuf::from("/usr/bin/google-chrome"),
                PathBuf::from("/usr/bin/google-chrome-stable"),
                PathBuf::from("/opt/google/chrome/chrome"),
            ],
            BrowserKind::Chromium => vec![
                PathBuf::from("/usr/bin/chromium"),
                PathBuf::from("/usr/bin/chromium-browser"),
                PathBuf::from("/snap/bin/chromium"),
            ],
            BrowserKind::Brave => vec![
                PathBuf::from("/usr/bin/brave-browser"),
                PathBuf::from("/opt/brave.com/brave/brave"),
            ],
            BrowserKind::Edge => vec![
                PathBuf::from("/usr/bin/microsoft-edge"),
                PathBuf::from("/opt/microsoft/msedge/msedge"),
            ],
        };

        #[cfg(target_os = "windows")]
        return {
            let relative = match self {
                BrowserKind::Chrome => r"Google\Chrome\Application\chrome.exe",
                BrowserKind::Chromium => r"Chromium\Application\chrome.exe",
                BrowserKind::Brave => r"BraveSoftware\Brave-Browser\Application\brave.exe",
                BrowserKind::Edge => r"Microsoft\Edge\Application\msedge.exe",
            };
            let mut roots = vec![
                PathBuf::from(r"C:\Program Files"),
                PathBuf::from(r"C:\Program Files (x86)"),
            ];
            if let Some(local) = dirs::data_local_dir() {
                roots.push(local);
            }
            roots.into_iter().map(|root| root.join(relative)).collect()
        };

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        return vec![];
    }

    /// Guess the browser from an executable path
    pub fn from_executable(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.contains("brave") {
            Some(BrowserKind::Brave)
        } else if name.contains("edge") || name.starts_with("msedge") {
            Some(BrowserKind::Edge)
        } else if name.contains("chromium") {
            Some(BrowserKind::Chromium)
        } else if name.contains("chrome") {
            Some(BrowserKind::Chrome)
        } else {
            None
        }
    }

    fn handle(&self, executable: PathBuf) -> BrowserHandle {
        BrowserHandle {
            name: self.display_name().to_string(),
            executable,
            process_name: self.process_name().to_string(),
        }
    }
}

/// Locates a Chromium-based browser on the system
pub struct BrowserFinder {
    custom_path: Option<PathBuf>,
}

impl BrowserFinder {
    /// Create a new BrowserFinder with optional custom path
    pub fn new(custom_path: Option<PathBuf>) -> Self {
        Self { custom_path }
    }

    /// Find a browser, checking the custom path first, then platform
    /// defaults, then PATH
    pub fn find(&self) -> Result<BrowserHandle> {
        if let Some(ref path) = self.custom_path {
            let executable = validate_executable(path)?;
            return Ok(custom_handle(executable));
        }

        for kind in BrowserKind::ALL {
            for path in kind.default_paths() {
                if let Ok(executable) = validate_executable(&path) {
                    tracing::debug!("Found {} at {}", kind.display_name(), executable.display());
                    return Ok(kind.handle(executable));
                }
            }
        }

        for kind in BrowserKind::ALL {
            for command in kind.commands() {
                if let Ok(executable) = which::which(command) {
                    tracing::debug!("Found {} on PATH: {}", kind.display_name(), executable.display());
                    return Ok(kind.handle(executable));
                }
            }
        }

        Err(Error::Browser(format!(
            "No Chromium-based browser found. Checked: {}. Use --browser-path to specify location.",
            BrowserKind::ALL
                .iter()
                .flat_map(|kind| kind.default_paths())
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

fn custom_handle(executable: PathBuf) -> BrowserHandle {
    match BrowserKind::from_executable(&executable) {
        Some(kind) => kind.handle(executable),
        None => {
            let process_name = executable
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            BrowserHandle {
                name: process_name.clone(),
                executable,
                process_name,
            }
        }
    }
}

/// Validate that a path exists and is executable
fn validate_executable(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(Error::Browser(format!(
            "Browser not found at: {}",
            path.display()
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path)?;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(Error::Browser(format!(
                "Browser binary not executable: {}",
                path.display()
            )));
        }
    }

    Ok(path.to_path_buf())
}
