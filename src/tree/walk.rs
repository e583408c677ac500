//! Depth-first traversal of a manifest
//!
//! [`Walk`] visits every entry in pre-order, root first, and hands the caller
//! the sorted child names of each visited entry. Names removed from that list
//! before the walk advances are not descended into.
//!
//! [`Paths`] flattens a walk into relative path strings and takes a
//! recurse/don't-recurse decision for the previously returned path every time
//! it is asked for the next one.

use crate::tree::attrs::Attributes;
use crate::tree::manifest::{Manifest, NodeId};

struct Current<'a> {
    path: Vec<&'a str>,
    id: NodeId,
    names: Vec<&'a str>,
}

/// Pre-order walker with caller-controlled pruning
pub struct Walk<'a> {
    manifest: &'a Manifest,
    stack: Vec<(Vec<&'a str>, NodeId)>,
    current: Option<Current<'a>>,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(manifest: &'a Manifest) -> Self {
        Self {
            manifest,
            stack: vec![(Vec::new(), manifest.root().id())],
            current: None,
        }
    }

    /// Move to the next entry
    ///
    /// Before moving, the children still listed for the previously visited
    /// entry are scheduled for visiting.
    pub fn advance(&mut self) -> Option<Visit<'_, 'a>> {
        self.descend();
        let manifest = self.manifest;
        let (path, id) = self.stack.pop()?;
        let entry = manifest.entry(id);
        let current = self.current.insert(Current {
            path,
            id,
            names: entry.names().collect(),
        });
        Some(Visit {
            current,
            attrs: entry.attrs(),
        })
    }

    /// Do not descend into any child of the entry visited last
    pub fn skip_children(&mut self) {
        if let Some(current) = self.current.as_mut() {
            current.names.clear();
        }
    }

    fn descend(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        let manifest = self.manifest;
        let parent = manifest.entry(current.id);
        // Reverse push so the smallest name is popped first
        for name in current.names.iter().rev() {
            if let Some(child) = parent.get(name) {
                let mut path = current.path.clone();
                path.push(child.name());
                self.stack.push((path, child.id()));
            }
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = WalkEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().map(|visit| visit.to_entry())
    }
}

/// The entry a [`Walk`] is currently positioned on
pub struct Visit<'w, 'a> {
    current: &'w mut Current<'a>,
    attrs: &'a Attributes,
}

impl<'w, 'a> Visit<'w, 'a> {
    /// Components from the root; empty for the root itself
    pub fn path(&self) -> &[&'a str] {
        &self.current.path
    }

    pub fn path_string(&self) -> String {
        self.current.path.join("/")
    }

    pub fn names(&self) -> &[&'a str] {
        &self.current.names
    }

    /// Child names still to be visited; remove names to prune them
    pub fn names_mut(&mut self) -> &mut Vec<&'a str> {
        &mut self.current.names
    }

    pub fn attrs(&self) -> &'a Attributes {
        self.attrs
    }

    fn to_entry(&self) -> WalkEntry<'a> {
        WalkEntry {
            path: self.current.path.clone(),
            names: self.current.names.clone(),
            attrs: self.attrs,
        }
    }
}

/// Snapshot of one visited entry, as produced by iterating a [`Walk`]
#[derive(Debug, Clone, PartialEq)]
pub struct WalkEntry<'a> {
    pub path: Vec<&'a str>,
    pub names: Vec<&'a str>,
    pub attrs: &'a Attributes,
}

impl WalkEntry<'_> {
    pub fn path_string(&self) -> String {
        self.path.join("/")
    }
}

/// Result of polling a [`Paths`] cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPoll {
    Path(String),
    /// Returned on every poll once the walk is finished
    Exhausted,
}

/// Lazy sequence of relative paths below the root
pub struct Paths<'a> {
    walk: Walk<'a>,
    recursive: bool,
    emitted: bool,
}

impl<'a> Paths<'a> {
    pub(crate) fn new(manifest: &'a Manifest, recursive: bool) -> Self {
        Self {
            walk: Walk::new(manifest),
            recursive,
            emitted: false,
        }
    }

    /// Default recursion policy used when no explicit control is given
    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn set_recursive(&mut self, recursive: bool) {
        self.recursive = recursive;
    }

    /// Return the next path
    ///
    /// `recurse` decides whether the path returned by the previous call is
    /// descended into; `None` falls back to the default policy. The root is
    /// always descended and never returned.
    pub fn advance(&mut self, recurse: Option<bool>) -> Option<String> {
        if self.emitted && !recurse.unwrap_or(self.recursive) {
            self.walk.skip_children();
        }
        loop {
            let path = self.walk.advance()?.path_string();
            if path.is_empty() {
                continue;
            }
            self.emitted = true;
            return Some(path);
        }
    }

    /// Never-ending form of [`Paths::advance`]
    pub fn poll(&mut self, recurse: Option<bool>) -> PathPoll {
        match self.advance(recurse) {
            Some(path) => PathPoll::Path(path),
            None => PathPoll::Exhausted,
        }
    }
}

impl Iterator for Paths<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.advance(None)
    }
}
