//! Writing a manifest as text and parsing it back

use super::generators::manifest;
use manifest::{ManifestParser, ManifestWriter};
use proptest::prelude::*;

#[test]
fn test_write_then_parse_preserves_manifest() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&manifest(24), |m| {
            let text = ManifestWriter::new().render(&m);
            let parsed = ManifestParser::new().parse_str(&text).unwrap();
            prop_assert_eq!(&parsed, &m);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_indent_choice_does_not_change_structure() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(manifest(16), 1usize..5), |(m, width)| {
            let text = ManifestWriter::new().indent(" ".repeat(width)).render(&m);
            let parsed = ManifestParser::new().parse_str(&text).unwrap();
            prop_assert!(parsed.same_structure(&m));
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_paths_follow_walk_order() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&manifest(24), |m| {
            let from_walk: Vec<String> = m.walk().skip(1).map(|e| e.path_string()).collect();
            let from_paths: Vec<String> = m.paths().collect();
            prop_assert_eq!(from_paths.len(), m.entry_count());
            prop_assert_eq!(from_walk, from_paths);
            Ok(())
        })
        .unwrap();
}
