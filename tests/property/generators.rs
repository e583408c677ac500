//! Strategies producing arbitrary manifests

use manifest::{Attributes, Manifest};
use proptest::prelude::*;

/// One generated entry: its path components plus optional attributes
#[derive(Debug, Clone)]
pub struct EntrySpec {
    pub components: Vec<String>,
    pub size: Option<u64>,
    pub mode: Option<u64>,
    pub sha1: Option<[u8; 20]>,
}

fn entry_spec() -> impl Strategy<Value = EntrySpec> {
    (
        prop::collection::vec("[a-z][a-z.-]{0,2}", 1..4),
        prop::option::of(any::<u32>()),
        prop::option::of(prop::sample::select(vec![0o100644u64, 0o040755, 0o120777])),
        prop::option::of(any::<[u8; 20]>()),
    )
        .prop_map(|(components, size, mode, sha1)| EntrySpec {
            components,
            size: size.map(u64::from),
            mode,
            sha1,
        })
}

/// Arbitrary manifest of up to `max_entries` leaf paths (parents are implied)
pub fn manifest(max_entries: usize) -> impl Strategy<Value = Manifest> {
    prop::collection::vec(entry_spec(), 0..max_entries).prop_map(|specs| build(&specs))
}

/// Build a manifest, creating missing parents without attributes
///
/// A path seen twice keeps the attributes of its first occurrence.
pub fn build(specs: &[EntrySpec]) -> Manifest {
    let mut m = Manifest::new();
    for spec in specs {
        for depth in 1..=spec.components.len() {
            let prefix = &spec.components[..depth];
            if m.resolve(&prefix.join("/")).is_some() {
                continue;
            }
            let mut attrs = Attributes::new();
            if depth == spec.components.len() {
                if let Some(size) = spec.size {
                    attrs.insert("size", size).unwrap();
                }
                if let Some(mode) = spec.mode {
                    attrs.insert("mode", mode).unwrap();
                }
                if let Some(sha1) = spec.sha1 {
                    attrs.insert("sha1", hex::encode(sha1)).unwrap();
                }
            }
            m.add(prefix, attrs).unwrap();
        }
    }
    m
}
