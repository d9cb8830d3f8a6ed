use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Detects and stops browser processes by name
pub trait ProcessControl {
    fn is_running(&self, process_name: &str) -> bool;

    /// Ask every matching process to exit. Returns false if the request
    /// could not be delivered.
    fn kill(&self, process_name: &str) -> bool;

    /// Poll until no matching process remains or `timeout` elapses
    fn wait_for_exit(&self, process_name: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_running(process_name) {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(POLL_INTERVAL);
        }
        true
    }
}

/// Uses the platform's process tools (`pgrep`/`pkill`, `tasklist`/`taskkill`)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl ProcessControl for SystemProcesses {
    fn is_running(&self, process_name: &str) -> bool {
        #[cfg(unix)]
        {
            Command::new("pgrep")
                .arg("-x")
                .arg(process_name)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false)
        }

        #[cfg(windows)]
        {
            Command::new("tasklist")
                .args(["/FI", &format!("IMAGENAME eq {}", process_name), "/NH"])
                .stderr(Stdio::null())
                .output()
                .map(|output| {
                    String::from_utf8_lossy(&output.stdout)
                        .to_lowercase()
                        .contains(&process_name.to_lowercase())
                })
                .unwrap_or(false)
        }
    }

    fn kill(&self, process_name: &str) -> bool {
        tracing::debug!("Stopping running '{}' processes", process_name);

        #[cfg(unix)]
        let status = Command::new("pkill")
            .arg("-x")
            .arg(process_name)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        #[cfg(windows)]
        let status = Command::new("taskkill")
            .args(["/IM", process_name, "/F"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::warn!("Failed to stop '{}': {}", process_name, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Countdown {
        remaining: Cell<u32>,
    }

    impl ProcessControl for Countdown {
        fn is_running(&self, _process_name: &str) -> bool {
            let left = self.remaining.get();
            if left == 0 {
                return false;
            }
            self.remaining.set(left - 1);
            true
        }

        fn kill(&self, _process_name: &str) -> bool {
            true
        }
    }

    #[test]
    fn test_wait_for_exit_returns_once_process_is_gone() {
        let processes = Countdown {
            remaining: Cell::new(2),
        };
        assert!(processes.wait_for_exit("chrome", Duration::from_secs(5)));
    }

    #[test]
    fn test_wait_for_exit_times_out() {
        let processes = Countdown {
            remaining: Cell::new(u32::MAX),
        };
        assert!(!processes.wait_for_exit("chrome", Duration::ZERO));
    }

    #[cfg(unix)]
    #[test]
    fn test_unknown_process_is_not_running() {
        assert!(!SystemProcesses.is_running("extpack-no-such-process"));
    }
}
