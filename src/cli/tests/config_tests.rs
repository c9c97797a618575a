use super::args::CliArgs;
use super::config::{load_manifest, parse_manifest, resolve_options};
use clap::Parser;
use std::fs;

fn args(extra: &[&str]) -> CliArgs {
    let mut argv = vec!["semac", "unit.json"];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).expect("parse should succeed")
}

#[test]
fn manifest_without_options_uses_defaults() {
    let manifest = parse_manifest(r#"{"name": "App"}"#).expect("manifest should parse");
    assert_eq!(manifest.unit.name, "App");
    assert!(manifest.unit.types.is_empty());
    assert!(manifest.compiler_options.is_none());

    let options = resolve_options(&manifest, &args(&[]));
    assert!(!options.report_unused_fields);
    assert!(!options.warnings_as_errors);
    assert!(options.synthesize_members);
}

#[test]
fn compiler_options_accept_string_booleans() {
    let manifest = parse_manifest(
        r#"{
            "name": "App",
            "compilerOptions": {
                "reportUnusedFields": "yes",
                "warningsAsErrors": false,
                "synthesizeMembers": "off"
            }
        }"#,
    )
    .expect("manifest should parse");
    let options = resolve_options(&manifest, &args(&[]));
    assert!(options.report_unused_fields);
    assert!(!options.warnings_as_errors);
    assert!(!options.synthesize_members);
}

#[test]
fn invalid_boolean_string_is_rejected() {
    let err = parse_manifest(r#"{"name": "App", "compilerOptions": {"warningsAsErrors": "maybe"}}"#)
        .expect_err("parse should fail");
    assert!(err.to_string().contains("invalid boolean value"));
}

#[test]
fn command_line_flags_override_the_manifest() {
    let manifest = parse_manifest(
        r#"{"name": "App", "compilerOptions": {"warningsAsErrors": false}}"#,
    )
    .expect("manifest should parse");
    let options = resolve_options(&manifest, &args(&["--warnings-as-errors", "--report-unused-fields"]));
    assert!(options.warnings_as_errors);
    assert!(options.report_unused_fields);
}

#[test]
fn load_manifest_reports_the_path() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = temp.path().join("unit.json");
    fs::write(&path, r#"{
            "name": "App",
            "types": [{"name": "C", "kind": "class", "location": {"file": "a.sm", "start": 0, "end": 5}}]
        }"#).expect("write manifest");
    let manifest = load_manifest(&path).expect("manifest should load");
    assert_eq!(manifest.unit.types.len(), 1);

    let missing = temp.path().join("missing.json");
    let err = load_manifest(&missing).expect_err("missing manifest");
    assert!(format!("{err:#}").contains("missing.json"));
}
