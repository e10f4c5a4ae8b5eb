//! Integration tests for patch manifests: loading from disk, host-version
//! gating, and registration into a live registry.

use modgraft::{
    load_from_path, load_from_str, ManifestError, ManifestOutcome, PatchRegistry,
};
use std::fs;
use tempfile::TempDir;

const PRIVACY_MANIFEST: &str = r#"
[meta]
name = "privacy"
description = "Silence outbound telemetry calls"
host_range = ">=1.2.0, <2.0.0"

[[patches]]
name = "drop-track-calls"
find = "trackEvent"
find_literal = true

[[patches.replacements]]
match = 'trackEvent\(([^)]*)\)'
replace = "void($1)"
all = true

[[patches]]
name = "null-analytics-endpoint"
find = 'ANALYTICS_ENDPOINT'
find_literal = true

[[patches.replacements]]
match = 'ANALYTICS_ENDPOINT="[^"]*"'
replace = 'ANALYTICS_ENDPOINT=""'
"#;

fn write_manifest(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn load_manifest_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = write_manifest(&dir, "privacy.toml", PRIVACY_MANIFEST);

    let manifest = load_from_path(&path).unwrap();
    assert_eq!(manifest.meta.name, "privacy");
    assert_eq!(manifest.patches.len(), 2);
    assert_eq!(manifest.patches[0].name, "drop-track-calls");
}

#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = load_from_path(&missing).unwrap_err();
    match err {
        ManifestError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("expected Io error, got {other}"),
    }
}

#[test]
fn parse_error_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = write_manifest(&dir, "broken.toml", "[[patches]\nname=");

    let err = load_from_path(&path).unwrap_err();
    match err {
        ManifestError::Toml { path: Some(p), .. } => assert_eq!(p, path),
        other => panic!("expected Toml error with path, got {other}"),
    }
}

#[test]
fn manifest_registers_for_matching_host() {
    let registry = PatchRegistry::new();
    let manifest = load_from_str(PRIVACY_MANIFEST).unwrap();

    let outcome = registry.register_manifest(&manifest, "1.3.5").unwrap();
    assert_eq!(outcome, ManifestOutcome::Registered { count: 2 });

    let names: Vec<_> = registry
        .definitions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    assert_eq!(names, ["drop-track-calls", "null-analytics-endpoint"]);
}

#[test]
fn manifest_skipped_for_newer_host() {
    let registry = PatchRegistry::new();
    let manifest = load_from_str(PRIVACY_MANIFEST).unwrap();

    let outcome = registry.register_manifest(&manifest, "2.0.0").unwrap();
    match outcome {
        ManifestOutcome::SkippedVersion { reason } => {
            assert!(reason.contains("2.0.0"));
            assert!(reason.contains(">=1.2.0"));
        }
        other => panic!("expected SkippedVersion, got {other:?}"),
    }
    assert!(registry.is_empty());
}

#[test]
fn several_manifests_accumulate_in_registration_order() {
    let registry = PatchRegistry::new();
    let first = load_from_str(
        r#"
[[patches]]
name = "alpha"
[[patches.replacements]]
match = "a"
literal = true
replace = "b"
"#,
    )
    .unwrap();
    let second = load_from_str(
        r#"
[[patches]]
name = "beta"
[[patches.replacements]]
match = "c"
literal = true
replace = "d"
"#,
    )
    .unwrap();

    let outcome = registry.register_manifest(&first, "1.0.0").unwrap();
    assert_eq!(outcome, ManifestOutcome::Registered { count: 1 });
    let outcome = registry.register_manifest(&second, "1.0.0").unwrap();
    assert_eq!(outcome, ManifestOutcome::Registered { count: 1 });

    let names: Vec<_> = registry
        .definitions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    assert_eq!(names, ["alpha", "beta"]);
}
