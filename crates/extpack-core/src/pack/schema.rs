use super::types::{
    CURRENT_SCHEMA_VERSION, ExtensionKind, LEGACY_SCHEMA_VERSION, Pack, RepoRef,
};
use crate::{Error, Result, Violation};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    static ref SEMVER: Regex = Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$"
    )
    .expect("semver pattern is valid");
}

pub fn is_known_version(v: u64) -> bool {
    v == CURRENT_SCHEMA_VERSION || v == LEGACY_SCHEMA_VERSION
}

/// Validate a typed pack.
///
/// Runs the same checks as [`validate_document`] on the serialized form, so a
/// pack built in memory and a pack read from disk obey identical rules.
pub fn validate(pack: &Pack) -> std::result::Result<(), Vec<Violation>> {
    let document = serde_json::to_value(pack).map_err(|e| {
        vec![Violation::new("", format!("pack cannot be serialized: {}", e))]
    })?;

    let violations = validate_document(&document);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Check a raw pack document and return every violation found.
///
/// Never stops at the first problem; an empty list means the document is valid.
pub fn validate_document(document: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();

    let Some(root) = document.as_object() else {
        violations.push(Violation::new("", "pack must be a JSON object"));
        return violations;
    };

    match root.get("v") {
        None => violations.push(Violation::new("v", "schema version is missing")),
        Some(value) => match value.as_u64() {
            Some(v) if is_known_version(v) => {}
            Some(v) => violations.push(Violation::new(
                "v",
                format!("unknown schema version {}", v),
            )),
            None => violations.push(Violation::new("v", "schema version must be an integer")),
        },
    }

    check_non_empty_string(root, "name", "", &mut violations);
    check_string(root, "description", "", false, &mut violations);
    check_string(root, "created", "", false, &mut violations);
    check_string(root, "updated", "", true, &mut violations);
    check_author(root.get("author"), &mut violations);
    check_string_list(root, "tags", "", &mut violations);

    if let Some(version) = root.get("version") {
        match version.as_str() {
            Some(version) if SEMVER.is_match(version) => {}
            Some(version) => violations.push(Violation::new(
                "version",
                format!("'{}' is not a semantic version (MAJOR.MINOR.PATCH)", version),
            )),
            None => violations.push(Violation::new("version", "must be a string")),
        }
    }

    match root.get("extensions") {
        None => violations.push(Violation::new("extensions", "extension list is missing")),
        Some(Value::Array(extensions)) => {
            for (idx, extension) in extensions.iter().enumerate() {
                validate_descriptor(extension, &format!("extensions[{}]", idx), &mut violations);
            }
        }
        Some(_) => violations.push(Violation::new("extensions", "must be an array")),
    }

    violations
}

fn validate_descriptor(value: &Value, at: &str, violations: &mut Vec<Violation>) {
    let Some(descriptor) = value.as_object() else {
        violations.push(Violation::new(at, "extension entry must be an object"));
        return;
    };

    check_non_empty_string(descriptor, "name", at, violations);
    check_string(descriptor, "description", at, true, violations);
    check_string_list(descriptor, "permissions", at, violations);

    if let Some(value) = descriptor.get("manifestVersion") {
        let fits = value
            .as_u64()
            .is_some_and(|v| u32::try_from(v).is_ok());
        if !fits && !value.is_null() {
            violations.push(Violation::new(
                field_path(at, "manifestVersion"),
                "must be a non-negative integer",
            ));
        }
    }

    match descriptor.get("icons") {
        None | Some(Value::Null) => {}
        Some(Value::Object(icons)) if icons.values().all(Value::is_string) => {}
        Some(_) => violations.push(Violation::new(
            field_path(at, "icons"),
            "must map sizes to icon paths",
        )),
    }

    let kind = match descriptor.get("type").and_then(Value::as_str) {
        Some(tag) => match ExtensionKind::parse(tag) {
            Some(kind) => kind,
            None => {
                violations.push(Violation::new(
                    field_path(at, "type"),
                    format!(
                        "unknown type '{}' (expected one of local, github, store, bundled)",
                        tag
                    ),
                ));
                return;
            }
        },
        None => {
            violations.push(Violation::new(field_path(at, "type"), "type is missing"));
            return;
        }
    };

    if kind != ExtensionKind::Bundled {
        check_string(descriptor, "version", at, true, violations);
    }

    match kind {
        ExtensionKind::Local => check_non_empty_string(descriptor, "path", at, violations),
        ExtensionKind::Store => check_non_empty_string(descriptor, "id", at, violations),
        ExtensionKind::Github => {
            let valid_repo = descriptor
                .get("repo")
                .and_then(|repo| serde_json::from_value::<RepoRef>(repo.clone()).ok())
                .is_some_and(|repo| !repo.owner.is_empty() && !repo.name.is_empty());
            if !valid_repo {
                violations.push(Violation::new(
                    field_path(at, "repo"),
                    "github entries need a repo with non-empty owner and name",
                ));
            }
            if let Some(tag) = descriptor.get("releaseTag") {
                if !tag.is_string() && !tag.is_null() {
                    violations.push(Violation::new(
                        field_path(at, "releaseTag"),
                        "must be a string",
                    ));
                }
            }
        }
        ExtensionKind::Bundled => {
            match descriptor.get("files") {
                Some(Value::Object(files)) if files.values().all(Value::is_string) => {}
                Some(Value::Object(_)) => violations.push(Violation::new(
                    field_path(at, "files"),
                    "every bundled file must be an encoded string",
                )),
                _ => violations.push(Violation::new(
                    field_path(at, "files"),
                    "bundled entries need a files map",
                )),
            }
            check_non_empty_string(descriptor, "version", at, violations);
        }
    }
}

fn check_non_empty_string(
    object: &Map<String, Value>,
    field: &str,
    at: &str,
    violations: &mut Vec<Violation>,
) {
    let path = field_path(at, field);
    match object.get(field) {
        None => violations.push(Violation::new(path, "is required")),
        Some(Value::String(s)) if s.trim().is_empty() => {
            violations.push(Violation::new(path, "must not be empty"))
        }
        Some(Value::String(_)) => {}
        Some(_) => violations.push(Violation::new(path, "must be a string")),
    }
}

/// Optional string field; `nullable` also accepts an explicit `null`
fn check_string(
    object: &Map<String, Value>,
    field: &str,
    at: &str,
    nullable: bool,
    violations: &mut Vec<Violation>,
) {
    match object.get(field) {
        None | Some(Value::String(_)) => {}
        Some(Value::Null) if nullable => {}
        Some(_) => violations.push(Violation::new(field_path(at, field), "must be a string")),
    }
}

fn check_string_list(
    object: &Map<String, Value>,
    field: &str,
    at: &str,
    violations: &mut Vec<Violation>,
) {
    match object.get(field) {
        None => {}
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
        Some(_) => violations.push(Violation::new(
            field_path(at, field),
            "must be an array of strings",
        )),
    }
}

/// Author is either a bare name or `{ name, github? }`
fn check_author(author: Option<&Value>, violations: &mut Vec<Violation>) {
    let valid = match author {
        None | Some(Value::String(_)) => true,
        Some(Value::Object(profile)) => {
            profile.get("name").is_some_and(Value::is_string)
                && profile
                    .get("github")
                    .is_none_or(|handle| handle.is_string() || handle.is_null())
        }
        Some(_) => false,
    };
    if !valid {
        violations.push(Violation::new(
            "author",
            "must be a name or an object with a string name",
        ));
    }
}

fn field_path(at: &str, field: &str) -> String {
    if at.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", at, field)
    }
}

/// Migrate a pack to the current schema version.
///
/// v2 and v3 share a descriptor shape, so upgrading only bumps the tag and
/// stamps `updated`. Already-current packs come back untouched.
pub fn upgrade(mut pack: Pack) -> Result<Pack> {
    match pack.v {
        CURRENT_SCHEMA_VERSION => Ok(pack),
        LEGACY_SCHEMA_VERSION => {
            tracing::info!(
                "Upgrading pack '{}' from schema v{} to v{}",
                pack.name,
                LEGACY_SCHEMA_VERSION,
                CURRENT_SCHEMA_VERSION
            );
            pack.v = CURRENT_SCHEMA_VERSION;
            pack.updated = Some(chrono::Utc::now().to_rfc3339());
            Ok(pack)
        }
        other => Err(Error::UnknownSchemaVersion(other)),
    }
}
