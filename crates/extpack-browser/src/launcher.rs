use crate::process::{ProcessControl, SystemProcesses};
use extpack_core::install::{BrowserHandle, BrowserRelauncher, LaunchOptions, RelaunchOutcome};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

const DEFAULT_KILL_TIMEOUT: Duration = Duration::from_secs(10);

/// Restarts a browser with unpacked extensions loaded
pub struct BrowserLauncher<P: ProcessControl = SystemProcesses> {
    processes: P,
    kill_timeout: Duration,
}

impl BrowserLauncher {
    pub fn new() -> Self {
        Self::with_processes(SystemProcesses)
    }
}

impl Default for BrowserLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ProcessControl> BrowserLauncher<P> {
    pub fn with_processes(processes: P) -> Self {
        Self {
            processes,
            kill_timeout: DEFAULT_KILL_TIMEOUT,
        }
    }

    pub fn kill_timeout(mut self, timeout: Duration) -> Self {
        self.kill_timeout = timeout;
        self
    }

    /// Build browser command-line arguments
    fn build_args(extension_dirs: &[PathBuf], options: &LaunchOptions) -> Vec<String> {
        let joined = extension_dirs
            .iter()
            .map(|dir| dir.display().to_string())
            .collect::<Vec<_>>()
            .join(",");

        let mut args = vec![
            format!("--load-extension={}", joined),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
        ];

        if let Some(profile) = &options.profile_dir {
            args.push(format!("--user-data-dir={}", profile.display()));
        }

        args.extend(options.extra_args.iter().cloned());
        args
    }
}

impl<P: ProcessControl> BrowserRelauncher for BrowserLauncher<P> {
    fn relaunch(
        &self,
        browser: &BrowserHandle,
        extension_dirs: &[PathBuf],
        options: &LaunchOptions,
    ) -> RelaunchOutcome {
        let process_name = browser.process_name.as_str();

        if self.processes.is_running(process_name) {
            if !options.kill_running {
                tracing::info!("{} is running and may not be stopped", browser.name);
                return RelaunchOutcome::BrowserRunning;
            }

            tracing::info!("Closing running {}", browser.name);
            if !self.processes.kill(process_name)
                || !self.processes.wait_for_exit(process_name, self.kill_timeout)
            {
                return RelaunchOutcome::KillFailed;
            }
        }

        let args = Self::build_args(extension_dirs, options);
        tracing::debug!("Launching {} {}", browser.executable.display(), args.join(" "));

        match Command::new(&browser.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => RelaunchOutcome::Launched { pid: child.id() },
            Err(e) => RelaunchOutcome::LaunchFailed {
                message: format!("Failed to launch {}: {}", browser.name, e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeProcesses {
        running: Cell<bool>,
        kill_works: bool,
        killed: RefCell<Vec<String>>,
    }

    impl ProcessControl for FakeProcesses {
        fn is_running(&self, _process_name: &str) -> bool {
            self.running.get()
        }

        fn kill(&self, process_name: &str) -> bool {
            self.killed.borrow_mut().push(process_name.to_string());
            if self.kill_works {
                self.running.set(false);
            }
            self.kill_works
        }
    }

    fn handle(executable: PathBuf) -> BrowserHandle {
        BrowserHandle {
            name: "Test Browser".to_string(),
            executable,
            process_name: "testbrowser".to_string(),
        }
    }

    #[test]
    fn test_build_args_joins_extensions() {
        let dirs = vec![PathBuf::from("/tmp/a"), PathBuf::from("/tmp/b")];
        let options = LaunchOptions {
            profile_dir: Some(PathBuf::from("/tmp/profile")),
            extra_args: vec!["--incognito".to_string()],
            ..LaunchOptions::default()
        };

        let args = BrowserLauncher::<SystemProcesses>::build_args(&dirs, &options);

        assert_eq!(args[0], "--load-extension=/tmp/a,/tmp/b");
        assert!(args.contains(&"--no-first-run".to_string()));
        assert!(args.contains(&"--no-default-browser-check".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--incognito"));
    }

    #[test]
    fn test_build_args_without_profile() {
        let args = BrowserLauncher::<SystemProcesses>::build_args(
            &[PathBuf::from("/tmp/a")],
            &LaunchOptions::default(),
        );
        assert!(!args.iter().any(|a| a.starts_with("--user-data-dir=")));
    }

    #[test]
    fn test_running_browser_is_left_alone_without_kill() {
        let processes = FakeProcesses::default();
        processes.running.set(true);
        let launcher = BrowserLauncher::with_processes(processes);

        let options = LaunchOptions {
            kill_running: false,
            ..LaunchOptions::default()
        };
        let outcome = launcher.relaunch(
            &handle(PathBuf::from("/nonexistent/browser")),
            &[PathBuf::from("/tmp/a")],
            &options,
        );

        assert_eq!(outcome, RelaunchOutcome::BrowserRunning);
        assert!(launcher.processes.killed.borrow().is_empty());
    }

    #[test]
    fn test_kill_failure_is_reported() {
        let processes = FakeProcesses::default();
        processes.running.set(true);
        let launcher = BrowserLauncher::with_processes(processes).kill_timeout(Duration::ZERO);

        let outcome = launcher.relaunch(
            &handle(PathBuf::from("/nonexistent/browser")),
            &[PathBuf::from("/tmp/a")],
            &LaunchOptions::default(),
        );

        assert_eq!(outcome, RelaunchOutcome::KillFailed);
        assert_eq!(*launcher.processes.killed.borrow(), vec!["testbrowser".to_string()]);
    }

    #[test]
    fn test_missing_executable_fails_to_launch() {
        let processes = FakeProcesses {
            kill_works: true,
            ..FakeProcesses::default()
        };
        processes.running.set(true);
        let launcher = BrowserLauncher::with_processes(processes);

        let outcome = launcher.relaunch(
            &handle(PathBuf::from("/nonexistent/browser")),
            &[PathBuf::from("/tmp/a")],
            &LaunchOptions::default(),
        );

        assert!(matches!(outcome, RelaunchOutcome::LaunchFailed { .. }));
        assert_eq!(launcher.processes.killed.borrow().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_reports_pid() {
        let Ok(executable) = which::which("true") else {
            return;
        };
        let launcher = BrowserLauncher::with_processes(FakeProcesses::default());

        let outcome = launcher.relaunch(
            &handle(executable),
            &[PathBuf::from("/tmp/a")],
            &LaunchOptions::default(),
        );

        assert!(matches!(outcome, RelaunchOutcome::Launched { pid } if pid > 0));
    }
}
