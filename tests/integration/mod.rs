//! Integration tests for the manifest builders, merge/diff and CLI

mod cli_commands;
mod merge_diff;
mod test_utils;
