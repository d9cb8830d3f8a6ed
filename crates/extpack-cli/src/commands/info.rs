use super::{PackSource, human_size, print_json};
use crate::OutputFormat;
use anyhow::Result;
use console::style;
use extpack_core::pack::{ExtensionKind, Pack};
use serde::Serialize;

#[derive(Serialize)]
struct ExtensionSummary<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: ExtensionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    source: String,
    bundled_bytes: usize,
}

#[derive(Serialize)]
struct PackSummary<'a> {
    name: &'a str,
    version: &'a str,
    schema: u64,
    description: &'a str,
    author: String,
    tags: Vec<&'a str>,
    created: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated: Option<&'a str>,
    bundled_bytes: usize,
    extensions: Vec<ExtensionSummary<'a>>,
}

impl<'a> PackSummary<'a> {
    fn new(pack: &'a Pack) -> Self {
        Self {
            name: &pack.name,
            version: &pack.version,
            schema: pack.v,
            description: &pack.description,
            author: pack.author.to_string(),
            tags: pack.tags.iter().map(String::as_str).collect(),
            created: &pack.created,
            updated: pack.updated.as_deref(),
            bundled_bytes: pack.bundled_size(),
            extensions: pack
                .extensions
                .iter()
                .map(|descriptor| ExtensionSummary {
                    name: &descriptor.name,
                    kind: descriptor.kind(),
                    version: descriptor.version.as_deref(),
                    source: descriptor.display_source(),
                    bundled_bytes: descriptor.bundle_size(),
                })
                .collect(),
        }
    }
}

pub fn execute(source: &str, format: OutputFormat) -> Result<()> {
    let pack = PackSource::parse(source).load()?;
    let summary = PackSummary::new(&pack);

    if format.is_json() {
        return print_json(&summary);
    }

    println!(
        "\n{} {}",
        style(summary.name).bold().cyan(),
        style(format!("v{}", summary.version)).dim()
    );
    if !summary.description.is_empty() {
        println!("{}", summary.description);
    }
    println!();
    if !summary.author.is_empty() {
        println!("  Author:   {}", summary.author);
    }
    if !summary.tags.is_empty() {
        println!("  Tags:     {}", summary.tags.join(", "));
    }
    println!("  Created:  {}", summary.created);
    if let Some(updated) = summary.updated {
        println!("  Updated:  {}", updated);
    }
    println!("  Schema:   v{}", summary.schema);
    if summary.bundled_bytes > 0 {
        println!("  Bundled:  {}", human_size(summary.bundled_bytes));
    }

    println!("\n{}", style(format!("Extensions ({}):", summary.extensions.len())).bold());
    for extension in &summary.extensions {
        let size = if extension.bundled_bytes > 0 {
            format!(" ({})", human_size(extension.bundled_bytes))
        } else {
            String::new()
        };
        println!(
            "  {:<8} {} {}",
            extension.kind.as_str(),
            extension.name,
            style(extension.version.unwrap_or("")).dim()
        );
        println!("           {}{}", style(&extension.source).dim(), size);
    }

    Ok(())
}
