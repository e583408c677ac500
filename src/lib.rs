//! Manifest: hierarchical file-tree manifests
//!
//! A manifest is an ordered tree of named entries, each carrying a small map
//! of attributes (size, SHA-1, mode, owner). Manifests are built from a text
//! description, a live directory or a tar archive, walked depth-first in name
//! order, merged k-ways in lock-step and diffed structurally.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod source;
pub mod tree;

pub use error::ManifestError;
pub use merge::{Diff, Merge, PathKey, Slots};
pub use source::{DirWalker, ManifestBuilder, ManifestParser, ManifestWriter, TarWalker};
pub use tree::{AttrKey, AttrValue, Attributes, Entry, Manifest, PathPoll, Paths, Walk};
