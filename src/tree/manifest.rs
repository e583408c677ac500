//! The manifest tree: an arena of named entries with attributes
//!
//! Every entry lives in a `Vec` owned by its `Manifest`. Children are held as
//! a sorted name → id map and the parent link is a plain id, so an entry never
//! keeps its parent alive and `Entry` handles cannot outlive the tree they
//! borrow from.

use crate::error::ManifestError;
use crate::tree::attrs::Attributes;
use crate::tree::walk::{Paths, Walk};
use std::collections::BTreeMap;
use std::fmt;

/// Index of an entry inside its manifest's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    children: BTreeMap<String, NodeId>,
    attrs: Attributes,
}

impl Node {
    fn new(name: String, parent: Option<NodeId>, attrs: Attributes) -> Self {
        Self {
            name,
            parent,
            children: BTreeMap::new(),
            attrs,
        }
    }
}

/// A complete file-tree manifest
///
/// Built once (usually by one of the builders in [`crate::source`]), then
/// read-only for walking, merging and diffing. Shared borrows taken by
/// cursors prevent mutation while a traversal is in flight.
#[derive(Debug, Clone)]
pub struct Manifest {
    nodes: Vec<Node>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            nodes: vec![Node::new(String::new(), None, Attributes::new())],
        }
    }
}

impl Manifest {
    /// Create an empty manifest (a root with no children)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Entry<'_> {
        self.entry(ROOT)
    }

    /// Number of entries below the root
    pub fn entry_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// True when the root has no children
    pub fn is_empty(&self) -> bool {
        self.nodes[ROOT.0].children.is_empty()
    }

    pub(crate) fn entry(&self, id: NodeId) -> Entry<'_> {
        Entry { manifest: self, id }
    }

    /// Resolve a `/`-separated path relative to the root
    pub fn resolve(&self, pathspec: &str) -> Option<Entry<'_>> {
        self.root().resolve(pathspec)
    }

    /// Add a new leaf entry at `components`, starting from the root
    ///
    /// Every component but the last must already exist; the last must not.
    /// The tree is left untouched when an error is returned.
    pub fn add<S: AsRef<str>>(
        &mut self,
        components: &[S],
        attrs: Attributes,
    ) -> Result<NodeId, ManifestError> {
        let (last, parents) = components
            .split_last()
            .ok_or_else(|| ManifestError::InvalidPath("empty path".to_string()))?;

        let mut cur = ROOT;
        for component in parents {
            let component = component.as_ref();
            check_name(component, components)?;
            cur = *self.nodes[cur.0].children.get(component).ok_or_else(|| {
                ManifestError::InvalidPath(format!(
                    "missing parent '{}' for '{}'",
                    component,
                    join(components)
                ))
            })?;
        }

        check_name(last.as_ref(), components)?;
        self.insert_child(cur, last.as_ref(), attrs)
    }

    /// Add a direct child under an existing entry
    pub(crate) fn add_child(
        &mut self,
        parent: NodeId,
        name: &str,
        attrs: Attributes,
    ) -> Result<NodeId, ManifestError> {
        check_name(name, &[name])?;
        self.insert_child(parent, name, attrs)
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        name: &str,
        attrs: Attributes,
    ) -> Result<NodeId, ManifestError> {
        if self.nodes[parent.0].children.contains_key(name) {
            let mut path = self.entry(parent).path();
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(name);
            return Err(ManifestError::DuplicateEntry(path));
        }

        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Node::new(name.to_string(), Some(parent), attrs));
        self.nodes[parent.0].children.insert(name.to_string(), id);
        Ok(id)
    }

    /// Depth-first walk over every entry, root first
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(self)
    }

    /// Relative paths of every entry below the root, in pre-order
    pub fn paths(&self) -> Paths<'_> {
        Paths::new(self, true)
    }

    /// Like [`Manifest::paths`], with an explicit default recursion policy
    pub fn paths_with(&self, recursive: bool) -> Paths<'_> {
        Paths::new(self, recursive)
    }

    /// Compare names at every level, ignoring attributes
    pub fn same_structure(&self, other: &Manifest) -> bool {
        entries_match(self.root(), other.root(), false)
    }
}

impl PartialEq for Manifest {
    fn eq(&self, other: &Self) -> bool {
        entries_match(self.root(), other.root(), true)
    }
}

impl Eq for Manifest {}

fn entries_match(a: Entry<'_>, b: Entry<'_>, with_attrs: bool) -> bool {
    if with_attrs && a.attrs() != b.attrs() {
        return false;
    }
    a.len() == b.len()
        && a
            .children()
            .zip(b.children())
            .all(|(x, y)| x.name() == y.name() && entries_match(x, y, with_attrs))
}

fn check_name<S: AsRef<str>>(name: &str, components: &[S]) -> Result<(), ManifestError> {
    if name.is_empty() {
        return Err(ManifestError::InvalidPath(format!(
            "empty component in '{}'",
            join(components)
        )));
    }
    if name.contains('/') {
        return Err(ManifestError::InvalidPath(format!(
            "component '{}' contains '/'",
            name
        )));
    }
    Ok(())
}

fn join<S: AsRef<str>>(components: &[S]) -> String {
    components
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/")
}

/// Borrowed handle to one entry of a manifest
#[derive(Clone, Copy)]
pub struct Entry<'a> {
    manifest: &'a Manifest,
    id: NodeId,
}

impl<'a> Entry<'a> {
    fn node(&self) -> &'a Node {
        &self.manifest.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Entry name; empty for the root
    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }

    pub fn parent(&self) -> Option<Entry<'a>> {
        self.node().parent.map(|id| self.manifest.entry(id))
    }

    /// Direct child by name
    pub fn get(&self, name: &str) -> Option<Entry<'a>> {
        self.node()
            .children
            .get(name)
            .map(|&id| self.manifest.entry(id))
    }

    /// Children in name order
    pub fn children(&self) -> impl Iterator<Item = Entry<'a>> + 'a {
        let manifest = self.manifest;
        self.node()
            .children
            .values()
            .map(move |&id| manifest.entry(id))
    }

    /// Child names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.node().children.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.node().children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node().children.is_empty()
    }

    pub fn attrs(&self) -> &'a Attributes {
        &self.node().attrs
    }

    /// Path from the root, components joined by `/`
    pub fn path(&self) -> String {
        let mut names = Vec::new();
        let mut cur = Some(*self);
        while let Some(entry) = cur {
            if entry.is_root() {
                break;
            }
            names.push(entry.name());
            cur = entry.parent();
        }
        names.reverse();
        names.join("/")
    }

    /// Resolve a relative `/`-separated path from this entry
    ///
    /// `""` and `.` stay put, `..` moves to the parent. Missing components and
    /// `..` above the root yield `None`.
    pub fn resolve(&self, pathspec: &str) -> Option<Entry<'a>> {
        pathspec
            .split('/')
            .try_fold(*self, |cur, component| match component {
                "" | "." => Some(cur),
                ".." => cur.parent(),
                name => cur.get(name),
            })
    }
}

/// Two handles are equal when they point at the same entry of the same tree
impl PartialEq for Entry<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.manifest, other.manifest) && self.id == other.id
    }
}

impl Eq for Entry<'_> {}

impl fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("path", &self.path())
            .field("children", &self.len())
            .field("attrs", self.attrs())
            .finish()
    }
}
