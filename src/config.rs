//! Configuration System
//!
//! Layered configuration for the `manifest` tool: built-in defaults, then an
//! optional `manifest.toml` (or an explicit `--config` file), then
//! `MANIFEST_*` environment variables. Tests included.

use crate::error::ManifestError;
use crate::logging::{self, LoggingConfig};
use crate::tree::AttrKey;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "manifest.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Directory and archive scanning
    #[serde(default)]
    pub scan: ScanConfig,

    /// Text output
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub diff: DiffConfig,
}

/// Builder settings for directory and tar sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Attribute keys populated by the walkers
    #[serde(default = "default_attributes")]
    pub attributes: Vec<String>,

    /// Archive directory whose contents become the manifest
    #[serde(default = "default_tar_subdir")]
    pub tar_subdir: String,
}

fn default_attributes() -> Vec<String> {
    vec!["size".to_string(), "sha1".to_string(), "mode".to_string()]
}

fn default_tar_subdir() -> String {
    "./".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            attributes: default_attributes(),
            tar_subdir: default_tar_subdir(),
        }
    }
}

impl ScanConfig {
    /// The configured attribute names as known keys
    pub fn attr_keys(&self) -> Result<Vec<AttrKey>, ManifestError> {
        self.attributes.iter().map(|name| name.parse()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Indent string repeated once per level
    #[serde(default = "default_indent")]
    pub indent: String,
}

fn default_indent() -> String {
    "\t".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Report every path below a differing entry, not just the top one
    #[serde(default)]
    pub maximal: bool,
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Scan(String),
    Output(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Scan(msg) => write!(f, "Scan: {}", msg),
            ValidationError::Output(msg) => write!(f, "Output: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ManifestConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for name in &self.scan.attributes {
            if let Err(e) = name.parse::<AttrKey>() {
                errors.push(ValidationError::Scan(e.to_string()));
            }
        }

        if self.output.indent.is_empty() {
            errors.push(ValidationError::Output(
                "Indent cannot be empty".to_string(),
            ));
        }

        if let Err(e) = logging::validate(&self.logging) {
            errors.push(ValidationError::Logging(e.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Layered configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    search_dir: PathBuf,
    explicit: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            search_dir: PathBuf::from("."),
            explicit: None,
            env_prefix: "MANIFEST".to_string(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory searched for `manifest.toml`
    pub fn search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = dir.into();
        self
    }

    /// Use this file instead of `manifest.toml`; it must exist
    pub fn file(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.explicit = path.map(Into::into);
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> Result<ManifestConfig, ManifestError> {
        let builder = builder_with_defaults()?;
        let builder = self.add_file_source(builder);
        let builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("scan.attributes"),
        );

        let config: ManifestConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ManifestError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }

    fn add_file_source(&self, builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        if let Some(path) = &self.explicit {
            debug!(config_path = %path.display(), "Using explicit configuration file");
            return builder.add_source(File::from(path.as_path()).required(true));
        }
        let default_path = self.search_dir.join(CONFIG_FILE_NAME);
        if default_path.exists() {
            debug!(config_path = %default_path.display(), "Using configuration file");
        }
        builder.add_source(File::from(default_path.as_path()).required(false))
    }
}

/// Config builder with the built-in defaults applied
fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ManifestError> {
    Ok(Config::builder()
        .set_default("scan.attributes", default_attributes())?
        .set_default("scan.tar_subdir", default_tar_subdir())?
        .set_default("output.indent", default_indent())?
        .set_default("diff.maximal", false)?)
}
