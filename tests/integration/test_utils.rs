//! Shared fixtures for integration tests
//!
//! Builds the same small file tree on disk and inside a tar archive so that
//! the builders can be checked against each other.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory layout used by most tests
///
/// ```text
/// a-b            "dash"
/// a/
///     c          ""
///     d/
///         e      "nested\n"
/// z.txt          "hello\n"
/// ```
pub fn sample_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("a/d")).unwrap();
    fs::write(root.join("a-b"), "dash").unwrap();
    fs::write(root.join("a/c"), "").unwrap();
    fs::write(root.join("a/d/e"), "nested\n").unwrap();
    fs::write(root.join("z.txt"), "hello\n").unwrap();
    temp_dir
}

/// Archive `dir` under `prefix` into `out_dir/sample.tar`
pub fn archive_of(dir: &Path, prefix: &str, out_dir: &Path) -> PathBuf {
    let path = out_dir.join("sample.tar");
    let file = fs::File::create(&path).unwrap();
    let mut builder = tar::Builder::new(file);
    builder.follow_symlinks(false);
    builder.append_dir_all(prefix, dir).unwrap();
    builder.into_inner().unwrap();
    path
}

/// Write manifest text to a file and return its path
pub fn text_file(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}
