use super::args::CliArgs;
use super::config::parse_manifest;
use super::driver::{compile, compile_manifest};
use clap::Parser;
use sema_common::CancellationToken;
use sema_common::diagnostics::diagnostic_codes;
use sema_resolve::CompletionOutcome;
use std::ffi::OsStr;
use std::fs;

const TWO_FILES: &str = r#"{
    "name": "App",
    "types": [
        {
            "name": "A", "kind": "class",
            "members": [
                {"kind": "field", "name": "x", "ty": "Missing", "location": {"file": "a.sm", "start": 10, "end": 15}}
            ],
            "location": {"file": "a.sm", "start": 0, "end": 40}
        },
        {
            "name": "B", "kind": "class",
            "members": [
                {"kind": "field", "name": "y", "ty": "Absent", "location": {"file": "b.sm", "start": 10, "end": 15}}
            ],
            "location": {"file": "b.sm", "start": 0, "end": 40}
        }
    ]
}"#;

fn args(extra: &[&str]) -> CliArgs {
    let mut argv = vec!["semac", "unit.json"];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).expect("parse should succeed")
}

fn run(source: &str, extra: &[&str]) -> super::driver::CompilationResult {
    let manifest = parse_manifest(source).expect("manifest should parse");
    compile_manifest(manifest, &args(extra), &CancellationToken::none()).expect("compile should succeed")
}

#[test]
fn completes_every_type_and_reports_errors() {
    let result = run(TWO_FILES, &["--threads", "2"]);
    assert_eq!(result.outcome, CompletionOutcome::Complete);
    assert_eq!(result.completed_types, 2);
    assert!(result.has_errors());
    let files: Vec<&str> = result.diagnostics.iter().map(|d| d.file.as_str()).collect();
    assert_eq!(files, vec!["a.sm", "b.sm"]);
    assert!(
        result
            .diagnostics
            .iter()
            .all(|d| d.code == diagnostic_codes::TYPE_NOT_FOUND)
    );
}

#[test]
fn file_filter_restricts_completion_and_diagnostics() {
    let result = run(TWO_FILES, &["--file", "b.sm"]);
    assert_eq!(result.outcome, CompletionOutcome::Partial);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].file, "b.sm");
}

#[test]
fn clean_unit_has_no_errors() {
    let result = run(
        r#"{"name": "App", "types": [{"name": "C", "kind": "class", "location": {"file": "a.sm", "start": 0, "end": 5}}]}"#,
        &[],
    );
    assert_eq!(result.outcome, CompletionOutcome::Complete);
    assert!(!result.has_errors());
}

#[test]
fn cancelled_run_is_an_error() {
    let manifest = parse_manifest(TWO_FILES).expect("manifest should parse");
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = compile_manifest(manifest, &args(&[]), &cancel).expect_err("cancelled");
    assert!(format!("{err:#}").contains("cancelled"));
}

#[test]
fn compile_reads_the_manifest_from_disk() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = temp.path().join("unit.json");
    fs::write(&path, TWO_FILES).expect("write manifest");
    let args = CliArgs::try_parse_from([OsStr::new("semac"), path.as_os_str()]).expect("parse should succeed");
    let result = compile(&args).expect("compile should succeed");
    assert_eq!(result.diagnostics.len(), 2);
}
