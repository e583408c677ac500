//! Command-line interface
//!
//! Clap types for the `manifest` binary plus the run context that dispatches
//! each subcommand to the library.

use crate::config::{ConfigLoader, ManifestConfig};
use crate::error::ManifestError;
use crate::merge::{Diff, Merge, Slots};
use crate::source::{Loader, ManifestWriter};
use crate::tree::Manifest;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Manifest CLI - build, walk, merge and diff file-tree manifests
#[derive(Parser, Debug)]
#[command(name = "manifest")]
#[command(about = "Build, walk, merge and diff file-tree manifests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides ./manifest.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Attributes collected from directories and archives (comma separated)
    #[arg(long, global = true, value_delimiter = ',')]
    pub attrs: Option<Vec<String>>,

    /// Archive directory whose contents form the manifest
    #[arg(long, global = true)]
    pub tar_subdir: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a manifest and print it in text form
    Show {
        /// Directory, .tar archive, manifest text file, or - for stdin
        source: String,
        /// Indent string (defaults to the configured indent)
        #[arg(long)]
        indent: Option<String>,
        /// Only print these attribute keys (comma separated)
        #[arg(long, value_delimiter = ',')]
        keys: Option<Vec<String>>,
    },
    /// List the relative paths of every entry
    Paths {
        source: String,
        /// Only list top-level entries
        #[arg(long)]
        no_recursive: bool,
    },
    /// Merge several manifests into rows of aligned paths
    Merge {
        #[arg(required = true)]
        sources: Vec<String>,
    },
    /// Show rows where some manifest lacks a path (exit status 2 if any)
    Diff {
        #[arg(required = true)]
        sources: Vec<String>,
        /// Report every missing descendant, not just the topmost one
        #[arg(long)]
        maximal: bool,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: RowFormat,
    },
}

/// How merge and diff rows are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RowFormat {
    /// Tab separated, `-` for a missing path
    Text,
    /// JSON array of rows, `null` for a missing path
    Json,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Show { .. } => "show",
            Commands::Paths { .. } => "paths",
            Commands::Merge { .. } => "merge",
            Commands::Diff { .. } => "diff",
        }
    }
}

/// What a command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    /// Process exit status
    pub status: i32,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self { text, status: 0 }
    }
}

/// Exit status of `diff` when the inputs differ
pub const EXIT_DIFFERENCES: i32 = 2;

/// Runtime context for CLI execution
pub struct RunContext {
    config: ManifestConfig,
    loader: Loader,
}

impl RunContext {
    /// Load configuration and apply the scan overrides given on the command line
    pub fn new(cli: &Cli) -> Result<Self, ManifestError> {
        let mut config = ConfigLoader::new().file(cli.config.clone()).load()?;
        if let Some(attrs) = &cli.attrs {
            config.scan.attributes = attrs.clone();
        }
        if let Some(subdir) = &cli.tar_subdir {
            config.scan.tar_subdir = subdir.clone();
        }
        Self::from_config(config)
    }

    pub fn from_config(config: ManifestConfig) -> Result<Self, ManifestError> {
        let loader = Loader::from_config(&config.scan)?;
        Ok(Self { config, loader })
    }

    pub fn config(&self) -> &ManifestConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ManifestError> {
        let start = Instant::now();
        let output = match command {
            Commands::Show {
                source,
                indent,
                keys,
            } => {
                let manifest = self.loader.load(source)?;
                let mut writer = ManifestWriter::new()
                    .indent(indent.as_deref().unwrap_or(&self.config.output.indent));
                if let Some(keys) = keys {
                    writer = writer.attr_keys(keys.iter().cloned());
                }
                CommandOutput::ok(writer.render(&manifest))
            }
            Commands::Paths {
                source,
                no_recursive,
            } => {
                let manifest = self.loader.load(source)?;
                let text: String = manifest
                    .paths_with(!no_recursive)
                    .map(|path| path + "\n")
                    .collect();
                CommandOutput::ok(text)
            }
            Commands::Merge { sources } => {
                let manifests = self.load_all(sources)?;
                let rows: Vec<Slots> = Merge::new(&manifests).collect();
                CommandOutput::ok(format_rows(&rows, RowFormat::Text)?)
            }
            Commands::Diff {
                sources,
                maximal,
                format,
            } => {
                let manifests = self.load_all(sources)?;
                let maximal = *maximal || self.config.diff.maximal;
                let rows: Vec<Slots> = Diff::new(&manifests).recursive(maximal).collect();
                debug!(differences = rows.len(), maximal, "Diff complete");
                CommandOutput {
                    text: format_rows(&rows, *format)?,
                    status: if rows.is_empty() { 0 } else { EXIT_DIFFERENCES },
                }
            }
        };
        info!(
            command = command.name(),
            duration_ms = start.elapsed().as_millis(),
            "Command finished"
        );
        Ok(output)
    }

    fn load_all(&self, sources: &[String]) -> Result<Vec<Manifest>, ManifestError> {
        sources.iter().map(|source| self.loader.load(source)).collect()
    }
}

/// Render merge or diff rows
pub fn format_rows(rows: &[Slots], format: RowFormat) -> Result<String, ManifestError> {
    match format {
        RowFormat::Text => Ok(rows
            .iter()
            .map(|row| {
                let cells: Vec<&str> = row.iter().map(|s| s.as_deref().unwrap_or("-")).collect();
                cells.join("\t") + "\n"
            })
            .collect()),
        RowFormat::Json => {
            let mut text = serde_json::to_string_pretty(rows).map_err(std::io::Error::from)?;
            text.push('\n');
            Ok(text)
        }
    }
}
