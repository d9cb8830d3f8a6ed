//! Text-safe pack encoding for share links (`<base>/#<encoded>`).

use super::reader::PackReader;
use super::types::Pack;
use crate::Result;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use url::Url;

/// Serialize a pack compactly and base64 it
pub fn encode(pack: &Pack) -> Result<String> {
    let json = serde_json::to_string(pack)?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Reverse [`encode`].
///
/// Used speculatively on arbitrary input, so anything malformed (bad base64,
/// non-UTF-8, invalid JSON, invalid pack) yields `None` instead of an error.
pub fn decode(encoded: &str) -> Option<Pack> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return None;
    }

    let bytes = STANDARD
        .decode(encoded)
        .or_else(|_| URL_SAFE.decode(encoded))
        .or_else(|_| URL_SAFE_NO_PAD.decode(encoded))
        .ok()?;
    let json = String::from_utf8(bytes).ok()?;

    match PackReader::from_str(&json) {
        Ok(pack) => Some(pack),
        Err(e) => {
            tracing::debug!("Shared pack payload rejected: {}", e);
            None
        }
    }
}

/// Build a share link for a pack
pub fn share_url(pack: &Pack, base_url: &str) -> Result<String> {
    Ok(format!("{}/#{}", base_url.trim_end_matches('/'), encode(pack)?))
}

/// Extract and decode the pack embedded in a share link's fragment
pub fn parse_share_url(link: &str) -> Option<Pack> {
    let url = Url::parse(link.trim()).ok()?;
    let fragment = url.fragment()?;
    decode(fragment)
}
