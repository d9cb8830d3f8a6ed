//! validate, info and share against pack files on disk

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

#[allow(deprecated)]
fn get_extpack_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("extpack")
}

const VALID_PACK: &str = r#"{
  "v": 3,
  "name": "Work",
  "description": "Daily tools",
  "author": {"name": "Ada", "github": "ada"},
  "version": "1.2.0",
  "tags": ["focus"],
  "created": "2024-06-01T12:00:00+00:00",
  "extensions": [
    {"type": "store", "name": "uBlock Origin Lite", "id": "ddkjiahejlhfcafbddmgiahcphecmpfh"},
    {"type": "github", "name": "Dark Reader", "repo": {"owner": "darkreader", "name": "darkreader"}}
  ]
}"#;

fn write_pack(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_validate_accepts_valid_pack() {
    let tmp = tempfile::tempdir().unwrap();
    let pack = write_pack(tmp.path(), "work.extpack", VALID_PACK);

    let mut cmd = Command::new(get_extpack_bin());
    cmd.arg("validate").arg(&pack);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("is a valid pack"));
}

#[test]
fn test_validate_lists_every_violation() {
    let tmp = tempfile::tempdir().unwrap();
    let pack = write_pack(
        tmp.path(),
        "bad.extpack",
        r#"{"v": 3, "name": "", "extensions": [{"type": "bogus", "name": "x"}, {"type": "local", "name": "y"}]}"#,
    );

    let mut cmd = Command::new(get_extpack_bin());
    cmd.arg("validate").arg(&pack);

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("name"))
        .stdout(predicate::str::contains("extensions[0].type"))
        .stdout(predicate::str::contains("extensions[1].path"))
        .stderr(predicate::str::contains("violation(s) found"));
}

#[test]
fn test_validate_json_output() {
    let tmp = tempfile::tempdir().unwrap();
    let pack = write_pack(tmp.path(), "bad.extpack", r#"{"v": 7, "name": "x", "extensions": []}"#);

    let mut cmd = Command::new(get_extpack_bin());
    cmd.arg("validate").arg(&pack).arg("--json");

    let output = cmd.assert().failure().get_output().stdout.clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(report["violations"][0]["path"], "v");
}

#[test]
fn test_validate_rejects_malformed_json() {
    let tmp = tempfile::tempdir().unwrap();
    let pack = write_pack(tmp.path(), "broken.extpack", "{\"v\": 3,");

    let mut cmd = Command::new(get_extpack_bin());
    cmd.arg("validate").arg(&pack);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn test_info_shows_metadata() {
    let tmp = tempfile::tempdir().unwrap();
    let pack = write_pack(tmp.path(), "work.extpack", VALID_PACK);

    let mut cmd = Command::new(get_extpack_bin());
    cmd.arg("info").arg(&pack);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Work"))
        .stdout(predicate::str::contains("Ada (@ada)"))
        .stdout(predicate::str::contains("Extensions (2)"))
        .stdout(predicate::str::contains("darkreader/darkreader"));
}

#[test]
fn test_info_upgrades_legacy_pack() {
    let tmp = tempfile::tempdir().unwrap();
    let pack = write_pack(tmp.path(), "old.extpack", &VALID_PACK.replace("\"v\": 3", "\"v\": 2"));

    let mut cmd = Command::new(get_extpack_bin());
    cmd.arg("--json").arg("info").arg(&pack);

    let output = cmd.assert().success().get_output().stdout.clone();
    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["schema"], 3);
    assert!(summary["updated"].is_string());
}

#[test]
fn test_info_rejects_invalid_pack_with_hint() {
    let tmp = tempfile::tempdir().unwrap();
    let pack = write_pack(tmp.path(), "bad.extpack", r#"{"v": 3, "extensions": []}"#);

    let mut cmd = Command::new(get_extpack_bin());
    cmd.arg("info").arg(&pack);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid pack file"))
        .stderr(predicate::str::contains("extpack validate"));
}

#[test]
fn test_share_link_round_trips_through_info() {
    let tmp = tempfile::tempdir().unwrap();
    let pack = write_pack(tmp.path(), "work.extpack", VALID_PACK);

    let mut cmd = Command::new(get_extpack_bin());
    cmd.arg("share")
        .arg(&pack)
        .args(["--base-url", "https://packs.example.com/open/"]);

    let output = cmd.assert().success().get_output().stdout.clone();
    let link = String::from_utf8(output).unwrap().trim().to_string();
    assert!(link.starts_with("https://packs.example.com/open/#"));

    let mut cmd = Command::new(get_extpack_bin());
    cmd.arg("info").arg(&link);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Work"))
        .stdout(predicate::str::contains("uBlock Origin Lite"));
}

#[test]
fn test_info_rejects_damaged_link() {
    let mut cmd = Command::new(get_extpack_bin());
    cmd.arg("info").arg("https://extpack.dev/install/#not-a-pack");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not contain a valid pack"));
}
