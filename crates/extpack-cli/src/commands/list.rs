use super::print_json;
use crate::OutputFormat;
use anyhow::{Context, Result};
use console::style;
use extpack_core::Settings;
use extpack_core::registry::{ExtensionStatus, InstalledPacks};

pub fn execute(settings: &Settings, format: OutputFormat) -> Result<()> {
    let registry = InstalledPacks::new(settings.registry_file());
    let packs = registry
        .load()
        .with_context(|| format!("Failed to read {}", registry.path().display()))?;

    if format.is_json() {
        return print_json(&packs);
    }

    if packs.is_empty() {
        println!("No packs installed yet.");
        return Ok(());
    }

    println!("Installed packs:");
    println!();

    for pack in &packs {
        let count = |status: ExtensionStatus| {
            pack.extensions
                .iter()
                .filter(|e| e.status == status)
                .count()
        };

        println!(
            "  {} {}  {}",
            style(&pack.name).bold(),
            style(format!("v{}", pack.version)).dim(),
            pack.installed_at
        );

        let mut parts = vec![format!("{} loaded", count(ExtensionStatus::Loaded))];
        let manual = count(ExtensionStatus::ManualInstall);
        if manual > 0 {
            parts.push(format!("{} manual", manual));
        }
        let failed = count(ExtensionStatus::Failed);
        if failed > 0 {
            parts.push(style(format!("{} failed", failed)).red().to_string());
        }
        println!("    {}", parts.join(", "));
        println!("    {}", style(&pack.source).dim());
    }

    Ok(())
}
