//! Laws relating merge rows, diff rows and the inputs' own paths

use super::generators::manifest;
use manifest::{Diff, Merge, PathKey, Slots};
use proptest::prelude::*;

fn row_key(row: &Slots) -> PathKey {
    let path = row.iter().flatten().next().expect("row has a present slot");
    PathKey::new(path)
}

#[test]
fn test_merge_columns_reproduce_inputs() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(manifest(16), manifest(16), manifest(16)), |(a, b, c)| {
            let inputs = [&a, &b, &c];
            let rows: Vec<Slots> = Merge::new(inputs).collect();

            for (column, input) in inputs.iter().enumerate() {
                let present: Vec<String> =
                    rows.iter().filter_map(|row| row[column].clone()).collect();
                let expected: Vec<String> = input.paths().collect();
                prop_assert_eq!(present, expected);
            }

            for row in &rows {
                prop_assert_eq!(row.len(), 3);
                let mut present = row.iter().flatten();
                let first = present.next();
                prop_assert!(first.is_some());
                prop_assert!(present.all(|p| Some(p) == first));
            }

            for pair in rows.windows(2) {
                prop_assert!(row_key(&pair[0]) < row_key(&pair[1]));
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_diff_of_manifest_with_itself_is_empty() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&manifest(24), |m| {
            prop_assert_eq!(Diff::new([&m, &m]).count(), 0);
            prop_assert_eq!(Diff::new([&m, &m]).recursive(true).count(), 0);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_maximal_diff_is_merge_rows_with_a_gap() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(manifest(16), manifest(16)), |(a, b)| {
            let expected: Vec<Slots> = Merge::new([&a, &b])
                .filter(|row| row.iter().any(Option::is_none))
                .collect();
            let maximal: Vec<Slots> = Diff::new([&a, &b]).recursive(true).collect();
            prop_assert_eq!(maximal, expected);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_minimal_diff_is_topmost_part_of_maximal() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(manifest(16), manifest(16)), |(a, b)| {
            let maximal: Vec<Slots> = Diff::new([&a, &b]).recursive(true).collect();
            let minimal: Vec<Slots> = Diff::new([&a, &b]).collect();

            for row in &minimal {
                prop_assert!(maximal.contains(row));
            }
            // Every divergent path lies at or below some reported one
            for row in &maximal {
                let key = row_key(row);
                let covered = minimal.iter().any(|top| {
                    let top = row_key(top);
                    key.as_str() == top.as_str()
                        || key.as_str().starts_with(&format!("{}/", top.as_str()))
                });
                prop_assert!(covered);
            }
            prop_assert_eq!(minimal.is_empty(), a.same_structure(&b));
            Ok(())
        })
        .unwrap();
}
