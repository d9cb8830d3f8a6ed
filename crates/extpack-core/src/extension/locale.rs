use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::path::Path;

lazy_static! {
    static ref MESSAGE_PLACEHOLDER: Regex =
        Regex::new(r"^__MSG_([A-Za-z0-9_@]+)__$").expect("placeholder pattern is valid");
}

const FALLBACK_LOCALES: [&str; 2] = ["en", "en_US"];

/// Resolve a `__MSG_key__` placeholder against the extension's message catalogs.
///
/// Looks in `_locales/<default_locale>/messages.json` first, then English.
/// Values that are not placeholders, and placeholders with no catalog entry,
/// come back unchanged. Never fails.
pub fn resolve_message(extension_dir: &Path, value: &str, default_locale: Option<&str>) -> String {
    let Some(captures) = MESSAGE_PLACEHOLDER.captures(value.trim()) else {
        return value.to_string();
    };
    let key = &captures[1];

    let mut locales: Vec<&str> = Vec::new();
    if let Some(locale) = default_locale {
        locales.push(locale);
    }
    for locale in FALLBACK_LOCALES {
        if !locales.contains(&locale) {
            locales.push(locale);
        }
    }

    locales
        .into_iter()
        .find_map(|locale| lookup(extension_dir, locale, key))
        .unwrap_or_else(|| value.to_string())
}

fn lookup(extension_dir: &Path, locale: &str, key: &str) -> Option<String> {
    let catalog_path = extension_dir
        .join("_locales")
        .join(locale)
        .join("messages.json");
    let content = std::fs::read_to_string(&catalog_path).ok()?;
    let catalog: Value = serde_json::from_str(content.trim_start_matches('\u{feff}')).ok()?;

    // Message names are case-insensitive
    let entry = catalog
        .as_object()?
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, entry)| entry)?;

    let message = entry.get("message")?.as_str()?;
    tracing::debug!("Resolved __MSG_{}__ from {}", key, catalog_path.display());
    Some(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_catalog(dir: &Path, locale: &str, json: &str) {
        let locale_dir = dir.join("_locales").join(locale);
        fs::create_dir_all(&locale_dir).unwrap();
        fs::write(locale_dir.join("messages.json"), json).unwrap();
    }

    #[test]
    fn test_plain_values_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_message(dir.path(), "My Extension", None), "My Extension");
    }

    #[test]
    fn test_resolves_from_default_locale() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), "de", r#"{"appName": {"message": "Meine Erweiterung"}}"#);
        write_catalog(dir.path(), "en", r#"{"appName": {"message": "My Extension"}}"#);

        assert_eq!(
            resolve_message(dir.path(), "__MSG_appName__", Some("de")),
            "Meine Erweiterung"
        );
    }

    #[test]
    fn test_falls_back_to_english_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), "en", r#"{"APPNAME": {"message": "My Extension"}}"#);

        assert_eq!(
            resolve_message(dir.path(), "__MSG_appName__", Some("fr")),
            "My Extension"
        );
    }

    #[test]
    fn test_unresolvable_placeholder_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), "en", "{ this is not json");

        assert_eq!(
            resolve_message(dir.path(), "__MSG_missing__", None),
            "__MSG_missing__"
        );
    }
}
