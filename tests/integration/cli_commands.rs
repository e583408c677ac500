//! Integration tests for the command layer and the `manifest` binary

use super::test_utils::{archive_of, sample_tree, text_file};
use manifest::cli::{Commands, RowFormat, RunContext, EXIT_DIFFERENCES};
use manifest::config::ManifestConfig;
use std::process::Command;
use tempfile::TempDir;

fn context() -> RunContext {
    RunContext::from_config(ManifestConfig::default()).unwrap()
}

fn path_arg(path: &std::path::Path) -> String {
    path.to_str().unwrap().to_string()
}

#[test]
fn test_show_text_source() {
    let dir = TempDir::new().unwrap();
    let source = text_file(dir.path(), "t.manifest", "foo {size: 0x10}\n  bar\nabc\n");
    let output = context()
        .execute(&Commands::Show {
            source: path_arg(&source),
            indent: Some("  ".to_string()),
            keys: None,
        })
        .unwrap();
    assert_eq!(output.status, 0);
    assert_eq!(output.text, "abc\nfoo {size: 16}\n  bar\n");
}

#[test]
fn test_paths_of_directory() {
    let tree = sample_tree();
    let output = context()
        .execute(&Commands::Paths {
            source: path_arg(tree.path()),
            no_recursive: true,
        })
        .unwrap();
    assert_eq!(output.text, "a\na-b\nz.txt\n");
}

#[test]
fn test_merge_directory_with_text() {
    let tree = sample_tree();
    let dir = TempDir::new().unwrap();
    let text = text_file(dir.path(), "t.manifest", "a\n\tc\nnew\n");
    let output = context()
        .execute(&Commands::Merge {
            sources: vec![path_arg(tree.path()), path_arg(&text)],
        })
        .unwrap();
    assert_eq!(
        output.text,
        "a\ta\na/c\ta/c\na/d\t-\na/d/e\t-\na-b\t-\n-\tnew\nz.txt\t-\n"
    );
}

#[test]
fn test_diff_directory_against_archive() {
    let tree = sample_tree();
    let out = TempDir::new().unwrap();
    let tar_path = archive_of(tree.path(), ".", out.path());
    let output = context()
        .execute(&Commands::Diff {
            sources: vec![path_arg(tree.path()), path_arg(&tar_path)],
            maximal: false,
            format: RowFormat::Text,
        })
        .unwrap();
    assert_eq!(output.status, 0);
    assert!(output.text.is_empty());
}

#[test]
fn test_diff_reports_minimal_rows_and_status() {
    let dir = TempDir::new().unwrap();
    let left = text_file(dir.path(), "left.manifest", "foo\n\tbar\n");
    let right = text_file(dir.path(), "right.manifest", "");
    let ctx = context();

    let minimal = ctx
        .execute(&Commands::Diff {
            sources: vec![path_arg(&left), path_arg(&right)],
            maximal: false,
            format: RowFormat::Text,
        })
        .unwrap();
    assert_eq!(minimal.status, EXIT_DIFFERENCES);
    assert_eq!(minimal.text, "foo\t-\n");

    let maximal = ctx
        .execute(&Commands::Diff {
            sources: vec![path_arg(&left), path_arg(&right)],
            maximal: true,
            format: RowFormat::Json,
        })
        .unwrap();
    let rows: Vec<Vec<Option<String>>> = serde_json::from_str(&maximal.text).unwrap();
    assert_eq!(
        rows,
        vec![
            vec![Some("foo".to_string()), None],
            vec![Some("foo/bar".to_string()), None],
        ]
    );
}

#[test]
fn test_broken_text_source_fails() {
    let dir = TempDir::new().unwrap();
    let source = text_file(dir.path(), "bad.manifest", "foo\n\tbar\n  baz\n");
    let result = context().execute(&Commands::Paths {
        source: path_arg(&source),
        no_recursive: false,
    });
    assert!(result.is_err());
}

#[test]
fn test_binary_diff_exit_status() {
    let dir = TempDir::new().unwrap();
    let left = text_file(dir.path(), "left.manifest", "foo\nbar\n");
    let same = text_file(dir.path(), "same.manifest", "bar\nfoo\n");
    let other = text_file(dir.path(), "other.manifest", "foo\n");

    let run = |a: &std::path::Path, b: &std::path::Path| {
        Command::new(env!("CARGO_BIN_EXE_manifest"))
            .current_dir(dir.path())
            .args(["--quiet", "diff"])
            .arg(a)
            .arg(b)
            .output()
            .unwrap()
    };

    let equal = run(&left, &same);
    assert_eq!(equal.status.code(), Some(0));
    assert!(equal.stdout.is_empty());

    let differing = run(&left, &other);
    assert_eq!(differing.status.code(), Some(EXIT_DIFFERENCES));
    assert_eq!(String::from_utf8_lossy(&differing.stdout), "bar\t-\n");
}

#[test]
fn test_binary_reports_errors_on_stderr() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_manifest"))
        .current_dir(dir.path())
        .args(["--quiet", "paths", "missing.manifest"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.manifest"));
}
