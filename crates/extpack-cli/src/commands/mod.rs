pub mod create;
pub mod forget;
pub mod info;
pub mod install;
pub mod list;
pub mod share;
pub mod validate;

use anyhow::{Context, Result};
use extpack_core::pack::{Pack, PackReader, parse_share_url};
use serde::Serialize;
use std::path::Path;

/// Where a pack given on the command line came from
pub(crate) enum PackSource {
    File(std::path::PathBuf),
    Link(String),
}

impl PackSource {
    /// Share links are recognised by their scheme; everything else is a path
    pub(crate) fn parse(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            PackSource::Link(arg.to_string())
        } else {
            PackSource::File(arg.into())
        }
    }

    pub(crate) fn load(&self) -> Result<Pack> {
        match self {
            PackSource::File(path) => read_pack(path),
            PackSource::Link(link) => parse_share_url(link).ok_or_else(|| {
                crate::Failure::new("The link does not contain a valid pack")
                    .with_hint("copy the whole link, including everything after '#'")
                    .into()
            }),
        }
    }
}

impl std::fmt::Display for PackSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackSource::File(path) => write!(f, "{}", path.display()),
            PackSource::Link(link) => write!(f, "{}", link),
        }
    }
}

pub(crate) fn read_pack(path: &Path) -> Result<Pack> {
    PackReader::from_file(path).with_context(|| format!("Failed to read pack {}", path.display()))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Human-readable byte count
pub(crate) fn human_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
