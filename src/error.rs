//! Error types for manifest construction, parsing and loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or loading a manifest
///
/// Traversal, merge and diff never fail; every variant here comes from
/// construction (`add`, builders) or from the ambient configuration layer.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Broken indentation at line {line} in {source_name}: level {indent} != {expected}")]
    InvalidIndentation {
        source_name: String,
        line: usize,
        indent: usize,
        expected: usize,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Cannot read {}: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("Invalid value for attribute '{key}': '{value}'")]
    InvalidAttributeValue { key: String, value: String },

    #[error("Unknown attribute: '{0}'")]
    UnknownAttribute(String),

    #[error("Malformed attribute list at line {line}: {text}")]
    MalformedAttributes { line: usize, text: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for ManifestError {
    fn from(err: config::ConfigError) -> Self {
        ManifestError::ConfigError(err.to_string())
    }
}

impl ManifestError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ManifestError::SourceUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
