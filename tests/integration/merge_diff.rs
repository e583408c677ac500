//! Integration tests for merging and diffing manifests built from archives

use manifest::{Diff, Manifest, Merge, Slots, TarWalker};
use std::path::Path;
use tar::{Builder, EntryType, Header};

/// Archive members: names ending in `/` are directories, the rest empty files
fn archive(members: &[&str]) -> Manifest {
    let mut builder = Builder::new(Vec::new());
    for member in members {
        let mut header = Header::new_gnu();
        let (path, entry_type, mode) = match member.strip_suffix('/') {
            Some(dir) => (dir, EntryType::Directory, 0o755),
            None => (*member, EntryType::Regular, 0o644),
        };
        header.set_entry_type(entry_type);
        header.set_mode(mode);
        header.set_size(0);
        header.set_mtime(0);
        builder.append_data(&mut header, path, std::io::empty()).unwrap();
    }
    let bytes = builder.into_inner().unwrap();
    TarWalker::new()
        .build_reader(&bytes[..], Path::new("<fixture>"))
        .unwrap()
}

fn empty() -> Manifest {
    archive(&["./"])
}

fn single_file() -> Manifest {
    archive(&["./", "foo"])
}

fn two_files() -> Manifest {
    archive(&["./", "foo", "bar"])
}

fn file_and_empty_subdir() -> Manifest {
    archive(&["./", "file", "subdir/"])
}

fn file_and_subdir() -> Manifest {
    archive(&["./", "file", "subdir/", "subdir/foo"])
}

fn files_at_many_levels() -> Manifest {
    archive(&[
        "./",
        "foo",
        "bar",
        "baz/",
        "baz/foo",
        "baz/bar",
        "baz/baz/",
        "baz/baz/foo",
        "baz/baz/bar",
        "baz/baz/baz",
    ])
}

fn all_fixtures() -> Vec<Manifest> {
    vec![
        empty(),
        single_file(),
        two_files(),
        file_and_empty_subdir(),
        file_and_subdir(),
        files_at_many_levels(),
    ]
}

fn rows(slots: &[&[Option<&str>]]) -> Vec<Slots> {
    slots
        .iter()
        .map(|row| row.iter().map(|s| s.map(str::to_string)).collect())
        .collect()
}

fn diff(a: &Manifest, b: &Manifest) -> Vec<Slots> {
    Diff::new([a, b]).collect()
}

#[test]
fn test_merge_two_empties() {
    let (m1, m2) = (Manifest::new(), empty());
    assert_eq!(Merge::new([&m1, &m2]).count(), 0);
    assert_eq!(m1, m2);
}

#[test]
fn test_merge_archive_with_text() {
    let m1 = single_file();
    let m2 = manifest::ManifestParser::new().parse_str("foo").unwrap();
    let merged: Vec<Slots> = Merge::new([&m1, &m2]).collect();
    assert_eq!(merged, rows(&[&[Some("foo"), Some("foo")]]));
}

#[test]
fn test_merge_empty_subdir_vs_nonempty_subdir() {
    let (m1, m2) = (file_and_empty_subdir(), file_and_subdir());
    let merged: Vec<Slots> = Merge::new([&m1, &m2]).collect();
    assert_eq!(
        merged,
        rows(&[
            &[Some("file"), Some("file")],
            &[Some("subdir"), Some("subdir")],
            &[None, Some("subdir/foo")],
        ])
    );
}

#[test]
fn test_diff_like_is_empty() {
    for (a, b) in all_fixtures().iter().zip(all_fixtures().iter()) {
        assert!(diff(a, b).is_empty());
        assert_eq!(a, b);
    }
}

#[test]
fn test_diff_unlike_is_nonempty_and_symmetric() {
    let fixtures = all_fixtures();
    let mut shifted = all_fixtures();
    shifted.rotate_left(1);
    for (a, b) in fixtures.iter().zip(shifted.iter()) {
        let forward = diff(a, b);
        let backward = diff(b, a);
        assert!(!forward.is_empty());
        assert_eq!(forward.len(), backward.len());
        assert_ne!(a, b);
    }
}

#[test]
fn test_diff_empty_vs_single_file() {
    let (m1, m2) = (empty(), single_file());
    assert_eq!(diff(&m1, &m2), rows(&[&[None, Some("foo")]]));
    assert_eq!(diff(&m2, &m1), rows(&[&[Some("foo"), None]]));
}

#[test]
fn test_diff_single_file_vs_two_files() {
    let (m1, m2) = (single_file(), two_files());
    assert_eq!(diff(&m1, &m2), rows(&[&[None, Some("bar")]]));
}

#[test]
fn test_diff_two_files_vs_file_and_empty_subdir() {
    let (m1, m2) = (two_files(), file_and_empty_subdir());
    assert_eq!(
        diff(&m1, &m2),
        rows(&[
            &[Some("bar"), None],
            &[None, Some("file")],
            &[Some("foo"), None],
            &[None, Some("subdir")],
        ])
    );
}

#[test]
fn test_diff_file_and_empty_subdir_vs_file_and_subdir() {
    let (m1, m2) = (file_and_empty_subdir(), file_and_subdir());
    assert_eq!(diff(&m1, &m2), rows(&[&[None, Some("subdir/foo")]]));
    assert_eq!(diff(&m2, &m1), rows(&[&[Some("subdir/foo"), None]]));
}

#[test]
fn test_minimal_and_maximal_diff_across_levels() {
    let (m1, m2) = (two_files(), files_at_many_levels());
    assert_eq!(diff(&m1, &m2), rows(&[&[None, Some("baz")]]));

    let maximal: Vec<Slots> = Diff::new([&m1, &m2]).recursive(true).collect();
    assert_eq!(
        maximal,
        rows(&[
            &[None, Some("baz")],
            &[None, Some("baz/bar")],
            &[None, Some("baz/baz")],
            &[None, Some("baz/baz/bar")],
            &[None, Some("baz/baz/baz")],
            &[None, Some("baz/baz/foo")],
            &[None, Some("baz/foo")],
        ])
    );
}

#[test]
fn test_interleaved_merge_and_walk_over_same_tree() {
    let m = files_at_many_levels();
    let mut merge = Merge::new([&m, &m]);
    let mut paths = m.paths();
    while let Some(row) = merge.advance(None) {
        let path = paths.next();
        assert_eq!(row[0], path);
        assert_eq!(row[0], row[1]);
    }
    assert!(paths.next().is_none());
}
