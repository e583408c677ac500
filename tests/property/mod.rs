//! Property-based tests for text round trips and merge/diff laws

mod generators;
mod merge_laws;
mod round_trip;
