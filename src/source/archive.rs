//! Tar archive walker
//!
//! Builds a manifest from the members of a tar archive found under a
//! subdirectory prefix. Members must appear after their parent directories,
//! which is how `tar` itself writes archives.

use crate::error::ManifestError;
use crate::source::mode::{S_IFBLK, S_IFCHR, S_IFDIR, S_IFIFO, S_IFLNK, S_IFREG};
use crate::source::{sha1_hex, ManifestBuilder};
use crate::tree::{AttrKey, AttrValue, Attributes, Manifest};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tar::{Archive, EntryType, Header};
use tracing::{debug, info, instrument, trace};

/// Builds a manifest from a tar archive
#[derive(Debug, Clone)]
pub struct TarWalker {
    attrs: Vec<AttrKey>,
    subdir: String,
}

impl Default for TarWalker {
    fn default() -> Self {
        Self {
            attrs: AttrKey::ALL.to_vec(),
            subdir: "./".to_string(),
        }
    }
}

impl TarWalker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attrs(attrs: &[AttrKey]) -> Self {
        Self {
            attrs: attrs.to_vec(),
            ..Self::default()
        }
    }

    /// Only include members below this archive directory
    pub fn subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = subdir.into();
        self
    }

    /// Build from an already opened archive stream
    ///
    /// `origin` names the stream in error messages.
    pub fn build_reader<R: Read>(
        &self,
        reader: R,
        origin: &Path,
    ) -> Result<Manifest, ManifestError> {
        let prefix = components(&self.subdir);
        let mut manifest = Manifest::new();
        let mut archive = Archive::new(reader);
        let entries = archive
            .entries()
            .map_err(|e| ManifestError::unreadable(origin, e))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| ManifestError::unreadable(origin, e))?;
            let entry_type = entry.header().entry_type();
            if is_metadata_member(entry_type) {
                continue;
            }

            let member = entry
                .path()
                .map_err(|e| ManifestError::unreadable(origin, e))?
                .to_str()
                .map(str::to_string)
                .ok_or_else(|| {
                    ManifestError::unreadable(origin, "member name is not valid UTF-8")
                })?;
            let parts = components(&member);
            let Some(rel) = parts.strip_prefix(prefix.as_slice()) else {
                trace!(member = %member, "Outside subdirectory, skipped");
                continue;
            };
            if rel.is_empty() {
                continue;
            }
            if rel.contains(&"..") {
                return Err(ManifestError::InvalidPath(member));
            }

            let attrs = self.member_attrs(&mut entry, origin)?;
            trace!(member = %member, attr_count = attrs.len(), "Adding member");
            manifest.add(rel, attrs)?;
        }
        Ok(manifest)
    }

    fn member_attrs<R: Read>(
        &self,
        entry: &mut tar::Entry<'_, R>,
        origin: &Path,
    ) -> Result<Attributes, ManifestError> {
        let unreadable = |e: std::io::Error| ManifestError::unreadable(origin, e);
        let header: Header = entry.header().clone();
        let entry_type = header.entry_type();
        let is_file = matches!(entry_type, EntryType::Regular | EntryType::Continuous);

        let mut attrs = Attributes::new();
        for key in &self.attrs {
            let value = match key {
                AttrKey::Size if is_file => AttrValue::Int(header.size().map_err(unreadable)?),
                AttrKey::Sha1 if is_file => AttrValue::Text(sha1_hex(entry).map_err(unreadable)?),
                AttrKey::Mode => {
                    let perms = u64::from(header.mode().map_err(unreadable)?) & 0o7777;
                    AttrValue::Int(type_bits(entry_type) | perms)
                }
                // Blank or garbled owner fields leave the attribute out
                AttrKey::Uid => match header.uid() {
                    Ok(uid) => AttrValue::Int(uid),
                    Err(e) => {
                        trace!(error = %e, "No usable uid in header");
                        continue;
                    }
                },
                AttrKey::Gid => match header.gid() {
                    Ok(gid) => AttrValue::Int(gid),
                    Err(e) => {
                        trace!(error = %e, "No usable gid in header");
                        continue;
                    }
                },
                _ => continue,
            };
            attrs.insert(key.as_str(), value)?;
        }
        Ok(attrs)
    }
}

impl ManifestBuilder for TarWalker {
    type Source = Path;

    fn supported_attrs(&self) -> &'static [AttrKey] {
        &AttrKey::ALL
    }

    #[instrument(skip(self, path), fields(path = %path.display(), subdir = %self.subdir))]
    fn build(&self, path: &Path) -> Result<Manifest, ManifestError> {
        let start = Instant::now();
        let file = File::open(path).map_err(|e| ManifestError::unreadable(path, e))?;
        let manifest = self.build_reader(file, path)?;
        debug!(attrs = ?self.attrs, "Archive walk complete");
        info!(
            entry_count = manifest.entry_count(),
            duration_ms = start.elapsed().as_millis(),
            "Built manifest from archive"
        );
        Ok(manifest)
    }
}

/// Split an archive path into its names, dropping `.` and empty components
fn components(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect()
}

fn is_metadata_member(entry_type: EntryType) -> bool {
    entry_type.is_pax_global_extensions()
        || entry_type.is_pax_local_extensions()
        || entry_type.is_gnu_longname()
        || entry_type.is_gnu_longlink()
}

fn type_bits(entry_type: EntryType) -> u64 {
    match entry_type {
        EntryType::Directory => S_IFDIR,
        EntryType::Symlink => S_IFLNK,
        EntryType::Char => S_IFCHR,
        EntryType::Block => S_IFBLK,
        EntryType::Fifo => S_IFIFO,
        _ => S_IFREG,
    }
}
