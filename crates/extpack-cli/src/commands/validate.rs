use super::print_json;
use crate::{Failure, OutputFormat};
use anyhow::{Context, Result};
use console::style;
use extpack_core::Violation;
use extpack_core::pack::validate_document;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ValidationReport<'a> {
    file: &'a Path,
    valid: bool,
    violations: &'a [Violation],
}

pub fn execute(file: &Path, format: OutputFormat) -> Result<()> {
    tracing::info!("Validating pack file: {}", file.display());

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        Failure::new(format!("{} is not valid JSON: {}", file.display(), e))
            .with_hint("pack files are JSON documents; was this file truncated?")
    })?;

    let violations = validate_document(&document);

    if format.is_json() {
        print_json(&ValidationReport {
            file,
            valid: violations.is_empty(),
            violations: &violations,
        })?;
    } else if violations.is_empty() {
        println!("{} {} is a valid pack", style("✓").green().bold(), file.display());
    } else {
        println!(
            "{} {} has {} problem(s):",
            style("✗").red().bold(),
            file.display(),
            violations.len()
        );
        for violation in &violations {
            println!("  {} {}", style(&violation.path).cyan(), violation.message);
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Failure::new(format!("{} violation(s) found", violations.len())).into())
    }
}
