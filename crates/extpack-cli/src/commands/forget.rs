use super::print_json;
use crate::{Failure, OutputFormat};
use anyhow::{Context, Result};
use console::style;
use extpack_core::Settings;
use extpack_core::registry::InstalledPacks;
use serde::Serialize;

#[derive(Serialize)]
struct Forgotten<'a> {
    name: &'a str,
    removed: bool,
}

/// Drops a pack from the registry. Cached files and the browser are left alone.
pub fn execute(name: &str, settings: &Settings, format: OutputFormat) -> Result<()> {
    let registry = InstalledPacks::new(settings.registry_file());
    let removed = registry
        .remove(name)
        .with_context(|| format!("Failed to update {}", registry.path().display()))?;

    if format.is_json() {
        print_json(&Forgotten { name, removed })?;
    } else if removed {
        println!("{} Forgot '{}'", style("✓").green().bold(), name);
    }

    if removed {
        Ok(())
    } else {
        Err(Failure::new(format!("No installed pack named '{}'", name))
            .with_hint("run `extpack list` to see installed packs")
            .into())
    }
}
