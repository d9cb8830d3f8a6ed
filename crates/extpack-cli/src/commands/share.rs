use super::{print_json, read_pack};
use crate::OutputFormat;
use anyhow::Result;
use extpack_core::pack::share_url;
use serde::Serialize;
use std::path::Path;

/// Page that opens shared packs
pub const DEFAULT_BASE_URL: &str = "https://extpack.dev/install";

#[derive(Serialize)]
struct ShareLink<'a> {
    name: &'a str,
    url: &'a str,
}

pub fn execute(file: &Path, base_url: &str, format: OutputFormat) -> Result<()> {
    let pack = read_pack(file)?;
    let url = share_url(&pack, base_url)?;

    if pack.bundled_size() > 0 {
        tracing::warn!(
            "'{}' embeds bundled files; the link will be long",
            pack.name
        );
    }

    if format.is_json() {
        print_json(&ShareLink {
            name: &pack.name,
            url: &url,
        })
    } else {
        println!("{}", url);
        Ok(())
    }
}
