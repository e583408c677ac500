//! Directory walker
//!
//! Mirrors a live directory tree into a manifest. Symlinks are recorded as
//! leaf entries and never followed.

use crate::error::ManifestError;
use crate::source::{sha1_hex, ManifestBuilder};
use crate::tree::{AttrKey, AttrValue, Attributes, Manifest, NodeId};
use std::fs::{self, File};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, trace};
use walkdir::{DirEntry, WalkDir};

/// Builds a manifest from a directory on disk
#[derive(Debug, Clone)]
pub struct DirWalker {
    attrs: Vec<AttrKey>,
}

impl Default for DirWalker {
    fn default() -> Self {
        Self {
            attrs: AttrKey::ALL.to_vec(),
        }
    }
}

impl DirWalker {
    /// Walker populating every supported attribute
    pub fn new() -> Self {
        Self::default()
    }

    /// Walker populating only `attrs`
    pub fn with_attrs(attrs: &[AttrKey]) -> Self {
        Self {
            attrs: attrs.to_vec(),
        }
    }

    fn entry_attrs(&self, entry: &DirEntry) -> Result<Attributes, ManifestError> {
        let path = entry.path();
        let metadata = entry
            .metadata()
            .map_err(|e| ManifestError::unreadable(path, e))?;
        let is_file = metadata.file_type().is_file();

        let mut attrs = Attributes::new();
        for key in &self.attrs {
            let value = match key {
                AttrKey::Size if is_file => Some(AttrValue::Int(metadata.len())),
                AttrKey::Sha1 if is_file => {
                    let mut file = File::open(path).map_err(|e| ManifestError::unreadable(path, e))?;
                    let digest =
                        sha1_hex(&mut file).map_err(|e| ManifestError::unreadable(path, e))?;
                    Some(AttrValue::Text(digest))
                }
                AttrKey::Mode => Some(AttrValue::Int(mode_bits(&metadata))),
                AttrKey::Uid => owner(&metadata).map(|(uid, _)| AttrValue::Int(uid)),
                AttrKey::Gid => owner(&metadata).map(|(_, gid)| AttrValue::Int(gid)),
                _ => None,
            };
            if let Some(value) = value {
                attrs.insert(key.as_str(), value)?;
            }
        }
        Ok(attrs)
    }
}

impl ManifestBuilder for DirWalker {
    type Source = Path;

    fn supported_attrs(&self) -> &'static [AttrKey] {
        &AttrKey::ALL
    }

    #[instrument(skip(self, root), fields(root = %root.display()))]
    fn build(&self, root: &Path) -> Result<Manifest, ManifestError> {
        let start = Instant::now();
        if !root.is_dir() {
            return Err(ManifestError::NotADirectory(root.to_path_buf()));
        }

        let mut manifest = Manifest::new();
        let root_id = manifest.root().id();
        // open[d] is the most recent directory at depth d
        let mut open: Vec<NodeId> = vec![root_id];

        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                ManifestError::unreadable(path, e)
            })?;
            let name = entry.file_name().to_str().ok_or_else(|| {
                ManifestError::unreadable(entry.path(), "file name is not valid UTF-8")
            })?;

            open.truncate(entry.depth());
            let parent = open.last().copied().unwrap_or(root_id);
            let attrs = self.entry_attrs(&entry)?;
            trace!(path = %entry.path().display(), attr_count = attrs.len(), "Adding entry");
            let id = manifest.add_child(parent, name, attrs)?;
            if entry.file_type().is_dir() {
                open.push(id);
            }
        }

        debug!(attrs = ?self.attrs, "Directory walk complete");
        info!(
            entry_count = manifest.entry_count(),
            duration_ms = start.elapsed().as_millis(),
            "Built manifest from directory"
        );
        Ok(manifest)
    }
}

#[cfg(unix)]
fn mode_bits(metadata: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    u64::from(metadata.mode())
}

#[cfg(not(unix))]
fn mode_bits(metadata: &fs::Metadata) -> u64 {
    use crate::source::mode::{S_IFDIR, S_IFLNK, S_IFREG};
    let file_type = metadata.file_type();
    if file_type.is_dir() {
        S_IFDIR | 0o755
    } else if file_type.is_symlink() {
        S_IFLNK | 0o777
    } else if metadata.permissions().readonly() {
        S_IFREG | 0o444
    } else {
        S_IFREG | 0o644
    }
}

#[cfg(unix)]
fn owner(metadata: &fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((u64::from(metadata.uid()), u64::from(metadata.gid())))
}

#[cfg(not(unix))]
fn owner(_metadata: &fs::Metadata) -> Option<(u64, u64)> {
    None
}
