//! K-way merge and structural diff over manifests
//!
//! [`Merge`] runs one path cursor per input manifest in lock-step. Every round
//! the cursors whose current path has the smallest key win; the round yields
//! one slot per input, holding the winners' paths and `None` elsewhere. Only
//! winning cursors advance. The caller may steer recursion into the winners
//! with the control passed to the next [`Merge::advance`] call.
//!
//! [`Diff`] consumes a merge and keeps only rows where some input is missing.

use crate::tree::{Manifest, PathPoll, Paths};
use std::cmp::Ordering;
use tracing::{debug, trace};

/// One merged row: a slot per input manifest
pub type Slots = Vec<Option<String>>;

/// Default merge key: a path compared component by component
///
/// Pre-order walks over sorted children produce paths in this order, which
/// plain string order does not guarantee (`"a-b"` sorts before `"a/c"`).
/// Two keys are equal exactly when the path strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathKey(String);

impl PathKey {
    pub fn new(path: &str) -> Self {
        PathKey(path.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for PathKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.split('/').cmp(other.0.split('/'))
    }
}

impl PartialOrd for PathKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Key function type used by [`Merge::new`] and [`Diff::new`]
pub type DefaultKey = fn(&str) -> PathKey;

fn path_key(path: &str) -> PathKey {
    PathKey::new(path)
}

/// Lock-step merge of N path sequences
pub struct Merge<'a, K, F> {
    cursors: Vec<Paths<'a>>,
    heads: Vec<Option<(String, K)>>,
    winners: Vec<bool>,
    key: F,
    started: bool,
}

impl<'a> Merge<'a, PathKey, DefaultKey> {
    /// Merge by path, recursing everywhere unless told otherwise
    pub fn new<I>(manifests: I) -> Self
    where
        I: IntoIterator<Item = &'a Manifest>,
    {
        Merge::with_key(manifests, path_key as DefaultKey)
    }
}

impl<'a, K, F> Merge<'a, K, F>
where
    K: Ord,
    F: Fn(&str) -> K,
{
    /// Merge using a caller-supplied key
    ///
    /// Each input's paths must be ordered by `key` for the rows to come out in
    /// increasing key order. Paths from different inputs with equal keys share
    /// a row; no further tie-breaking is done.
    pub fn with_key<I>(manifests: I, key: F) -> Self
    where
        I: IntoIterator<Item = &'a Manifest>,
    {
        let cursors: Vec<Paths<'a>> = manifests.into_iter().map(Manifest::paths).collect();
        let width = cursors.len();
        Self {
            cursors,
            heads: (0..width).map(|_| None).collect(),
            winners: vec![false; width],
            key,
            started: false,
        }
    }

    /// Set the default recursion policy of every input
    pub fn recursive(mut self, recursive: bool) -> Self {
        for cursor in &mut self.cursors {
            cursor.set_recursive(recursive);
        }
        self
    }

    /// Number of inputs (the length of every row)
    pub fn width(&self) -> usize {
        self.cursors.len()
    }

    /// Produce the next row
    ///
    /// `recurse` applies to every path of the previously returned row; `None`
    /// keeps each input's default policy.
    pub fn advance(&mut self, recurse: Option<bool>) -> Option<Slots> {
        if !self.started {
            self.started = true;
            for i in 0..self.cursors.len() {
                self.heads[i] = self.pull(i, None);
            }
        } else {
            for i in 0..self.cursors.len() {
                if self.winners[i] {
                    self.heads[i] = self.pull(i, recurse);
                }
            }
        }

        let winners: Vec<bool> = match self.heads.iter().flatten().map(|(_, k)| k).min() {
            Some(min) => self
                .heads
                .iter()
                .map(|head| matches!(head, Some((_, k)) if k == min))
                .collect(),
            None => {
                self.winners.fill(false);
                return None;
            }
        };

        let row: Slots = self
            .heads
            .iter_mut()
            .zip(&winners)
            .map(|(head, &won)| if won { head.take().map(|(path, _)| path) } else { None })
            .collect();
        trace!(
            winners = winners.iter().filter(|w| **w).count(),
            width = row.len(),
            "Merged row"
        );
        self.winners = winners;
        Some(row)
    }

    fn pull(&mut self, i: usize, recurse: Option<bool>) -> Option<(String, K)> {
        match self.cursors[i].poll(recurse) {
            PathPoll::Path(path) => {
                let key = (self.key)(&path);
                Some((path, key))
            }
            PathPoll::Exhausted => None,
        }
    }
}

impl<K, F> Iterator for Merge<'_, K, F>
where
    K: Ord,
    F: Fn(&str) -> K,
{
    type Item = Slots;

    fn next(&mut self) -> Option<Slots> {
        self.advance(None)
    }
}

/// Rows of a merge in which at least one input is missing
///
/// Where all inputs agree the filter always recurses, since agreement on an
/// entry says nothing about its children. Below a divergence it recurses only
/// in maximal mode; the default (minimal) stops at the first divergence.
pub struct Diff<'a, K, F> {
    merge: Merge<'a, K, F>,
    recursive: bool,
    control: Option<bool>,
}

impl<'a> Diff<'a, PathKey, DefaultKey> {
    /// Minimal diff by path
    pub fn new<I>(manifests: I) -> Self
    where
        I: IntoIterator<Item = &'a Manifest>,
    {
        Diff::with_key(manifests, path_key as DefaultKey)
    }
}

impl<'a, K, F> Diff<'a, K, F>
where
    K: Ord,
    F: Fn(&str) -> K,
{
    pub fn with_key<I>(manifests: I, key: F) -> Self
    where
        I: IntoIterator<Item = &'a Manifest>,
    {
        Self {
            merge: Merge::with_key(manifests, key),
            recursive: false,
            control: None,
        }
    }

    /// `true` reports every divergent descendant (maximal diff)
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

impl<K, F> Iterator for Diff<'_, K, F>
where
    K: Ord,
    F: Fn(&str) -> K,
{
    type Item = Slots;

    fn next(&mut self) -> Option<Slots> {
        loop {
            let row = self.merge.advance(self.control.take())?;
            if row.iter().all(Option::is_some) {
                self.control = Some(true);
                continue;
            }
            debug!(row = ?row, "Difference found");
            self.control = Some(self.recursive);
            return Some(row);
        }
    }
}
