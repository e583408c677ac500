//! Manifest sources
//!
//! Builders that produce a [`Manifest`] from a text description, a live
//! directory, or a tar archive, plus the text writer. Each builder populates a
//! caller-selected subset of the known attributes.

pub mod archive;
pub mod dir;
pub mod text;

pub use archive::TarWalker;
pub use dir::DirWalker;
pub use text::{ManifestParser, ManifestWriter, ParsedLine};

use crate::config::ScanConfig;
use crate::error::ManifestError;
use crate::tree::{AttrKey, Manifest};
use sha1::{Digest, Sha1};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// File type bits of a `mode` attribute
pub mod mode {
    pub const S_IFMT: u64 = 0o170000;
    pub const S_IFSOCK: u64 = 0o140000;
    pub const S_IFLNK: u64 = 0o120000;
    pub const S_IFREG: u64 = 0o100000;
    pub const S_IFBLK: u64 = 0o060000;
    pub const S_IFDIR: u64 = 0o040000;
    pub const S_IFCHR: u64 = 0o020000;
    pub const S_IFIFO: u64 = 0o010000;
}

/// Common interface of the manifest builders
pub trait ManifestBuilder {
    /// What the builder reads from
    type Source: ?Sized;

    /// Attribute keys this builder knows how to populate
    fn supported_attrs(&self) -> &'static [AttrKey];

    /// Build a complete manifest from `source`
    fn build(&self, source: &Self::Source) -> Result<Manifest, ManifestError>;
}

/// SHA-1 of everything readable from `reader`, as lowercase hex
pub(crate) fn sha1_hex<R: Read + ?Sized>(reader: &mut R) -> std::io::Result<String> {
    let mut hasher = Sha1::new();
    std::io::copy(reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// How a source argument is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Manifest text read from standard input (`-`)
    Stdin,
    /// A live directory
    Directory,
    /// A `.tar` archive
    Archive,
    /// A manifest text file
    Text,
}

impl SourceKind {
    pub fn detect(spec: &str) -> Self {
        let path = Path::new(spec);
        if spec == "-" {
            SourceKind::Stdin
        } else if path.is_dir() {
            SourceKind::Directory
        } else if path.extension().is_some_and(|ext| ext == "tar") {
            SourceKind::Archive
        } else {
            SourceKind::Text
        }
    }
}

/// Builds manifests from source arguments using the scan settings
#[derive(Debug, Clone)]
pub struct Loader {
    attrs: Vec<AttrKey>,
    tar_subdir: String,
}

impl Loader {
    pub fn new(attrs: Vec<AttrKey>, tar_subdir: impl Into<String>) -> Self {
        Self {
            attrs,
            tar_subdir: tar_subdir.into(),
        }
    }

    pub fn from_config(scan: &ScanConfig) -> Result<Self, ManifestError> {
        Ok(Self::new(scan.attr_keys()?, scan.tar_subdir.clone()))
    }

    /// Load the manifest named by `spec`
    pub fn load(&self, spec: &str) -> Result<Manifest, ManifestError> {
        let kind = SourceKind::detect(spec);
        debug!(source = spec, kind = ?kind, "Loading manifest");
        match kind {
            SourceKind::Stdin => {
                let stdin = std::io::stdin();
                ManifestParser::new().parse_reader(stdin.lock(), "<stdin>")
            }
            SourceKind::Directory => DirWalker::with_attrs(&self.attrs).build(Path::new(spec)),
            SourceKind::Archive => TarWalker::with_attrs(&self.attrs)
                .subdir(self.tar_subdir.clone())
                .build(Path::new(spec)),
            SourceKind::Text => ManifestParser::new().build(Path::new(spec)),
        }
    }
}
