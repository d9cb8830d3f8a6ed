//! `extpack install`: resolve a pack and relaunch the browser with it.

use super::{PackSource, print_json};
use crate::{Failure, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use extpack_browser::{BrowserFinder, BrowserLauncher, ProfileManager};
use extpack_core::Settings;
use extpack_core::install::{InstallResult, Installer, LaunchOptions, ProgressEvent};
use extpack_core::registry::InstalledPacks;
use extpack_remote::GitHubFetcher;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Pack file or share link
    #[arg(value_name = "FILE|LINK")]
    pub source: String,

    /// Path to the browser executable
    #[arg(long, value_name = "PATH")]
    pub browser_path: Option<PathBuf>,

    /// Install into a named, persistent browser profile
    #[arg(long, value_name = "NAME", conflicts_with = "temp_profile")]
    pub profile: Option<String>,

    /// Install into a fresh throwaway profile
    #[arg(long)]
    pub temp_profile: bool,

    /// Fail instead of closing a running browser
    #[arg(long)]
    pub no_kill: bool,

    /// Token for GitHub downloads
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

pub fn execute(args: InstallArgs, settings: &Settings, format: OutputFormat) -> Result<()> {
    let source = PackSource::parse(&args.source);
    let pack = source.load()?;

    let browser = BrowserFinder::new(args.browser_path.clone()).find()?;
    tracing::info!("Using {} at {}", browser.name, browser.executable.display());

    let profile = if args.temp_profile {
        Some(ProfileManager::temporary()?)
    } else if let Some(name) = &args.profile {
        Some(ProfileManager::named(&settings.profiles_dir(), name)?)
    } else {
        None
    };

    let options = LaunchOptions {
        kill_running: !args.no_kill,
        profile_dir: profile.as_ref().map(|p| p.path().to_path_buf()),
        ..LaunchOptions::default()
    };

    let fetcher = GitHubFetcher::new(args.github_token.clone())
        .context("Failed to set up the GitHub client")?;
    let launcher = BrowserLauncher::new();
    let registry = InstalledPacks::new(settings.registry_file());
    let installer = Installer::new(settings, &fetcher, &launcher, &registry);

    let bar = progress_bar(pack.extensions.len(), format);
    let mut on_progress = |event: ProgressEvent<'_>| match event {
        ProgressEvent::Started { descriptor, .. } => {
            bar.set_message(descriptor.name.clone());
        }
        ProgressEvent::Download {
            descriptor,
            fraction,
            ..
        } => {
            bar.set_message(format!("{} {:>3.0}%", descriptor.name, fraction * 100.0));
        }
        ProgressEvent::Finished { .. } => bar.inc(1),
    };

    let result = installer.install_pack(
        &pack,
        &source.to_string(),
        &browser,
        &options,
        &mut on_progress,
    );
    bar.finish_and_clear();

    // the browser keeps using a throwaway profile after we exit
    if result.is_success() {
        if let Some(profile) = profile {
            let path = profile.into_path();
            tracing::info!("Temporary profile kept at {}", path.display());
        }
    }

    if format.is_json() {
        print_json(&result)?;
    } else {
        print_report(&result, &browser.name);
    }

    if result.is_success() {
        return Ok(());
    }

    let mut failure = Failure::new(failure_message(&result));
    if let Some(hint) = result.outcome.hint() {
        failure = failure.with_hint(hint);
    }
    Err(failure.into())
}

fn progress_bar(total: usize, format: OutputFormat) -> ProgressBar {
    if format.is_json() {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    bar.enable_steady_tick(std::time::Duration::from_millis(120));
    bar
}

fn failure_message(result: &InstallResult) -> String {
    use extpack_core::install::InstallOutcome;

    match &result.outcome {
        InstallOutcome::Launched { .. } => format!("Installed '{}'", result.pack),
        InstallOutcome::NoExtensions => format!("Nothing in '{}' could be loaded", result.pack),
        InstallOutcome::BrowserRunning => "The browser is running".to_string(),
        InstallOutcome::KillFailed => "Could not close the running browser".to_string(),
        InstallOutcome::LaunchFailed { message } => message.clone(),
    }
}

fn print_report(result: &InstallResult, browser: &str) {
    let report = &result.report;

    for ready in &report.ready {
        let note = if ready.cached { " (cached)" } else { "" };
        println!(
            "{} {}{}",
            style("✓").green(),
            ready.name,
            style(note).dim()
        );
    }

    for manual in &report.manual {
        println!(
            "{} {} must be installed from the store: {}",
            style("→").yellow(),
            manual.name,
            style(&manual.url).underlined()
        );
    }

    for error in &report.errors {
        println!("{} {}: {}", style("✗").red(), error.name, error.message);
        if let Some(hint) = &error.hint {
            println!("    {} {}", style("hint:").yellow(), hint);
        }
    }

    if let extpack_core::install::InstallOutcome::Launched { pid } = result.outcome {
        println!();
        println!(
            "{} Launched {} with {} extension(s) (pid {})",
            style("✓").green().bold(),
            browser,
            report.ready.len(),
            pid
        );
    }
}
