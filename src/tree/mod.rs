//! Manifest tree
//!
//! The data model (entries, attributes) and its depth-first traversal.

pub mod attrs;
pub mod manifest;
pub mod walk;

pub use attrs::{AttrKey, AttrValue, Attributes};
pub use manifest::{Entry, Manifest, NodeId};
pub use walk::{PathPoll, Paths, Visit, Walk, WalkEntry};
