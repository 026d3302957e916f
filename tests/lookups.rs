use std::fs;
use std::path::PathBuf;

use skill4d::docs::{self, DocKind};
use skill4d::form;
use skill4d::grammar::{self, FindOptions};
use skill4d::tool4d::{self, Severity};
use skill4d::workflows::{self, InstallOptions, ReleaseTrigger};
use skill4d::publish::NonInteractive;
use tempfile::TempDir;

fn asset(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets").join(name)
}

#[test]
fn bundled_grammar_finds_commands() {
    let grammar = asset("commands.tsv");
    let options = FindOptions {
        limit: 0,
        ..Default::default()
    };

    let result = grammar::find("json", Some(&grammar), &options).unwrap();
    let names: Vec<&str> = result.matches.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["JSON Parse", "JSON Stringify"]);
    assert_eq!(result.malformed_lines, 0);

    let exact = grammar::find("string", Some(&grammar), &options).unwrap();
    assert_eq!(exact.matches[0].name, "String");

    let limited = FindOptions {
        limit: 1,
        ..Default::default()
    };
    let first = grammar::find("json", Some(&grammar), &limited).unwrap();
    assert_eq!(first.matches.len(), 1);
    assert_eq!(first.total, 2);
    assert!(first.truncated);
    assert!(!result.truncated);

    let themes = grammar::themes(Some(&grammar)).unwrap();
    assert!(themes.themes.iter().any(|t| t.theme == "JSON" && t.count == 2));
}

#[test]
fn missing_grammar_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = grammar::find("alert", Some(&dir.path().join("none.tsv")), &FindOptions::default())
        .unwrap_err();
    assert_eq!(err.code.as_str(), "grammar.not_found");
}

#[test]
fn bundled_schema_validates_forms() {
    let dir = TempDir::new().unwrap();
    let schema = asset("formsSchema.json");

    let good = dir.path().join("good.4DForm");
    fs::write(
        &good,
        r#"{"destination": "detailScreen", "pages": [null, {"objects": {"ok": {"type": "button", "left": 10, "top": 10, "width": 80, "height": 22}}}]}"#,
    )
    .unwrap();
    let result = form::validate(&good, Some(&schema)).unwrap();
    assert!(result.valid, "{:?}", result.errors);

    let bad = dir.path().join("bad.4DForm");
    fs::write(&bad, r#"{"destination": "elsewhere", "width": "wide"}"#).unwrap();
    let result = form::validate(&bad, Some(&schema)).unwrap();
    assert!(!result.valid);
    assert_eq!(result.error_count, result.errors.len());
    assert!(result.errors.iter().any(|e| e.starts_with("destination: ")));
    assert!(result.errors.iter().any(|e| e.starts_with("width: ")));
}

#[test]
fn compile_result_json_drives_diagnostics() {
    let stdout = concat!(
        "starting\n",
        r#"{"success":false,"errors":[{"message":"Unknown variable","isError":true,"code":{"path":"Methods/greet"},"lineInFile":4},{"message":"Unused","isError":false}]}"#,
        "\n"
    );
    let parsed = tool4d::parse_output(stdout, "");

    assert!(parsed.compile_result.is_some());
    assert_eq!(parsed.error_count(), 1);
    assert_eq!(parsed.warning_count(), 1);
    assert_eq!(parsed.diagnostics[0].method.as_deref(), Some("Methods/greet"));
    assert_eq!(parsed.diagnostics[0].line, Some(4));
    assert_eq!(parsed.diagnostics[1].severity, Severity::Warning);
}

#[test]
fn docs_urls_cover_topics_classes_and_commands() {
    let base = "https://developer.4d.com/docs";

    let (url, kind) = docs::resolve_url(base, "OPEN URL");
    assert_eq!(kind, DocKind::Command);
    assert_eq!(url, "https://developer.4d.com/docs/commands/open-url");

    let (_, kind) = docs::resolve_url(base, "4D.File");
    assert_eq!(kind, DocKind::Class);
}

#[test]
fn workflows_install_into_plain_folder() {
    let dir = TempDir::new().unwrap();
    let result = workflows::install(
        &InstallOptions {
            path: Some(dir.path().to_path_buf()),
            build: true,
            release: Some(ReleaseTrigger::Tag),
            push: false,
        },
        &mut NonInteractive,
    )
    .unwrap();

    assert_eq!(result.installed, vec!["build.yml", "release.yml"]);
    assert!(!result.committed);
    assert!(dir.path().join(".github/workflows/release.yml").is_file());
}
