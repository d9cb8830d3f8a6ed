//! `extpack create`: build a pack from extension folders.

use super::{human_size, print_json};
use crate::{Failure, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use extpack_core::bundle::{self, ExclusionPolicy};
use extpack_core::extension::{self, ScanOptions};
use extpack_core::pack::{
    Author, ExtensionDescriptor, ExtensionSource, Pack, PackWriter, RepoRef,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Extension directories (or roots to search with --scan)
    #[arg(value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Pack name
    #[arg(short, long)]
    pub name: String,

    /// Pack description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Author name
    #[arg(short, long, default_value = "")]
    pub author: String,

    /// Author's GitHub handle
    #[arg(long)]
    pub github_user: Option<String>,

    /// Pack version (MAJOR.MINOR.PATCH)
    #[arg(long = "version", value_name = "VERSION", default_value = "1.0.0")]
    pub pack_version: String,

    /// Tag the pack; repeatable
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Embed extension files in the pack instead of referencing local paths
    #[arg(short, long)]
    pub bundle: bool,

    /// Search the given directories for extensions
    #[arg(long)]
    pub scan: bool,

    /// Extra file pattern to leave out of bundles; repeatable
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Add a GitHub-hosted extension, owner/repo[@tag]; repeatable
    #[arg(long, value_name = "OWNER/REPO[@TAG]")]
    pub github: Vec<String>,

    /// Add a Chrome Web Store extension by id; repeatable
    #[arg(long, value_name = "ID")]
    pub store: Vec<String>,

    /// Output file (defaults to <name>.extpack)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct CreateSummary<'a> {
    path: &'a Path,
    name: &'a str,
    version: &'a str,
    extensions: usize,
    bundled_bytes: usize,
    skipped: Vec<SkippedDirectory>,
}

#[derive(Serialize)]
struct SkippedDirectory {
    path: PathBuf,
    message: String,
}

pub fn execute(args: CreateArgs, format: OutputFormat) -> Result<()> {
    let mut policy = ExclusionPolicy::default();
    for pattern in &args.exclude {
        policy = policy.with_pattern(pattern)?;
    }

    let (directories, skipped) = collect_directories(&args)?;

    let mut extensions = Vec::new();
    for dir in &directories {
        let descriptor = if args.bundle {
            bundle::bundle(dir, &policy)
                .with_context(|| format!("Failed to bundle {}", dir.display()))?
        } else {
            extension::validate(dir)
                .with_context(|| format!("Invalid extension at {}", dir.display()))?
        };
        tracing::debug!("Added {} ({})", descriptor.name, descriptor.kind());
        extensions.push(descriptor);
    }

    for spec in &args.github {
        extensions.push(github_descriptor(spec)?);
    }
    for id in &args.store {
        extensions.push(ExtensionDescriptor::new(
            id.clone(),
            ExtensionSource::Store { id: id.clone() },
        ));
    }

    if extensions.is_empty() {
        return Err(Failure::new("No extensions to pack")
            .with_hint("pass extension directories, --scan a folder, or add --github/--store entries")
            .into());
    }

    let author = match &args.github_user {
        Some(handle) => Author::Profile {
            name: args.author.clone(),
            github: Some(handle.clone()),
        },
        None => Author::Name(args.author.clone()),
    };

    let pack = Pack::new(&args.name, &args.description, author, extensions)
        .with_version(&args.pack_version)
        .with_tags(args.tags.iter().cloned());

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(pack.file_name()));
    PackWriter::to_file(&pack, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if format.is_json() {
        return print_json(&CreateSummary {
            path: &output,
            name: &pack.name,
            version: &pack.version,
            extensions: pack.extensions.len(),
            bundled_bytes: pack.bundled_size(),
            skipped,
        });
    }

    for skip in &skipped {
        println!(
            "{} skipped {}: {}",
            style("!").yellow(),
            skip.path.display(),
            skip.message
        );
    }
    println!(
        "{} Created {} with {} extension(s)",
        style("✓").green().bold(),
        style(output.display()).bold(),
        pack.extensions.len()
    );
    for descriptor in &pack.extensions {
        println!(
            "  {:<8} {} {}",
            descriptor.kind().as_str(),
            descriptor.name,
            style(descriptor.version.as_deref().unwrap_or("")).dim()
        );
    }
    if args.bundle {
        println!("  bundled size: {}", human_size(pack.bundled_size()));
    }

    Ok(())
}

/// Directories to pack, plus scan findings that could not be used
fn collect_directories(args: &CreateArgs) -> Result<(Vec<PathBuf>, Vec<SkippedDirectory>)> {
    if !args.scan {
        return Ok((args.dirs.clone(), Vec::new()));
    }

    let options = ScanOptions::default();
    let mut directories = Vec::new();
    let mut skipped = Vec::new();

    for root in &args.dirs {
        let result = extension::scan(root, &options);
        tracing::info!(
            "Found {} extension(s) under {}",
            result.extensions.len(),
            root.display()
        );

        directories.extend(result.extensions.into_iter().filter_map(|descriptor| {
            match descriptor.source {
                ExtensionSource::Local { path } => Some(path),
                _ => None,
            }
        }));
        skipped.extend(result.errors.into_iter().map(|err| SkippedDirectory {
            path: err.path,
            message: err.message,
        }));
    }

    Ok((directories, skipped))
}

/// Parse `owner/repo[@tag]`
fn github_descriptor(spec: &str) -> Result<ExtensionDescriptor> {
    let (repo, tag) = match spec.split_once('@') {
        Some((repo, tag)) if !tag.is_empty() => (repo, Some(tag.to_string())),
        Some((repo, _)) => (repo, None),
        None => (spec, None),
    };

    let repo = RepoRef::parse(repo).ok_or_else(|| {
        Failure::new(format!("Invalid GitHub repository '{}'", spec))
            .with_hint("use owner/repo or owner/repo@tag")
    })?;

    Ok(ExtensionDescriptor::new(
        repo.name.clone(),
        ExtensionSource::Github {
            repo,
            release_tag: tag,
        },
    ))
}
