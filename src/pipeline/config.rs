//! Launch configuration.
//!
//! Configuration is layered: built-in defaults, then an optional YAML file,
//! then `NTUPLE_*` environment variables. Command-line flags are applied on
//! top by the CLI.
//!
//! ```yaml
//! catalog:
//!   dir: ./catalogs
//!   pattern: "samples_*.csv"
//! policy:
//!   real_data_marker: Run201
//!   events_per_output_data: 500000
//!   events_per_output_mc: 200000
//! task:
//!   tag: OFFSHELL_v0
//!   tarfile: tarball_v0.tar.xz
//!   sites: [T2_US_UCSD]
//!   max_jobs: 1
//!   max_nevents_per_job: 100
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use globset::Glob;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::DEFAULT_CATALOG_PATTERN;
use crate::params::DerivationPolicy;
use crate::task::TaskSettings;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for this schema.
    #[error("Failed to parse config '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Where catalogs are looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Directory holding the catalogs.
    pub dir: PathBuf,
    /// File name glob selecting catalogs.
    pub pattern: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            pattern: DEFAULT_CATALOG_PATTERN.to_string(),
        }
    }
}

/// Complete configuration of one launch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Catalog lookup.
    pub catalog: CatalogSettings,
    /// Per-sample derivation policy.
    pub policy: DerivationPolicy,
    /// Settings copied into every task.
    pub task: TaskSettings,
}

impl LaunchConfig {
    /// Creates configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Applies overrides from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `NTUPLE_CATALOG_DIR`: Catalog directory
    /// - `NTUPLE_CATALOG_PATTERN`: Catalog file glob
    /// - `NTUPLE_REAL_DATA_MARKER`: Substring marking collision data
    /// - `NTUPLE_EVENTS_PER_OUTPUT_DATA`: Events per output for data
    /// - `NTUPLE_EVENTS_PER_OUTPUT_MC`: Events per output for simulation
    /// - `NTUPLE_TAG`: Production tag
    /// - `NTUPLE_TARFILE`: Tarball
    /// - `NTUPLE_SCRAM_ARCH`: SCRAM architecture
    /// - `NTUPLE_CMSSW_VERSION`: CMSSW release
    /// - `NTUPLE_SITES`: Comma-separated site whitelist
    /// - `NTUPLE_MAX_JOBS`: Maximum jobs per task
    /// - `NTUPLE_MAX_NEVENTS_PER_JOB`: Maximum events per job
    /// - `NTUPLE_IS_TREE_OUTPUT`: Whether outputs are flat trees
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides using `lookup` in place of the process environment.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Catalog settings
        if let Some(val) = lookup("NTUPLE_CATALOG_DIR") {
            self.catalog.dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("NTUPLE_CATALOG_PATTERN") {
            self.catalog.pattern = val;
        }

        // Policy settings
        if let Some(val) = lookup("NTUPLE_REAL_DATA_MARKER") {
            self.policy.real_data_marker = val;
        }

        if let Some(val) = lookup("NTUPLE_EVENTS_PER_OUTPUT_DATA") {
            self.policy.events_per_output_data =
                parse_env_value(&val, "NTUPLE_EVENTS_PER_OUTPUT_DATA")?;
        }

        if let Some(val) = lookup("NTUPLE_EVENTS_PER_OUTPUT_MC") {
            self.policy.events_per_output_mc = parse_env_value(&val, "NTUPLE_EVENTS_PER_OUTPUT_MC")?;
        }

        // Task settings
        if let Some(val) = lookup("NTUPLE_TAG") {
            self.task.tag = val;
        }

        if let Some(val) = lookup("NTUPLE_TARFILE") {
            self.task.tarfile = val;
        }

        if let Some(val) = lookup("NTUPLE_SCRAM_ARCH") {
            self.task.scram_arch = val;
        }

        if let Some(val) = lookup("NTUPLE_CMSSW_VERSION") {
            self.task.cmssw_version = val;
        }

        if let Some(val) = lookup("NTUPLE_SITES") {
            self.task.sites = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(val) = lookup("NTUPLE_MAX_JOBS") {
            self.task.max_jobs = parse_env_value(&val, "NTUPLE_MAX_JOBS")?;
        }

        if let Some(val) = lookup("NTUPLE_MAX_NEVENTS_PER_JOB") {
            self.task.max_nevents_per_job = parse_env_value(&val, "NTUPLE_MAX_NEVENTS_PER_JOB")?;
        }

        if let Some(val) = lookup("NTUPLE_IS_TREE_OUTPUT") {
            self.task.is_tree_output = parse_env_bool(&val, "NTUPLE_IS_TREE_OUTPUT")?;
        }

        Ok(())
    }

    /// Validates the settings the launcher itself depends on.
    ///
    /// Task settings are passed through to the framework unchecked.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.pattern.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "catalog pattern cannot be empty".to_string(),
            ));
        }

        if let Err(e) = Glob::new(&self.catalog.pattern) {
            return Err(ConfigError::ValidationFailed(format!(
                "catalog pattern '{}' is not a valid glob: {}",
                self.catalog.pattern, e
            )));
        }

        // An empty marker is contained in every dataset name.
        if self.policy.real_data_marker.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "real_data_marker cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder method to set the catalog directory.
    pub fn with_catalog_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.catalog.dir = dir.into();
        self
    }

    /// Builder method to set the catalog pattern.
    pub fn with_catalog_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.catalog.pattern = pattern.into();
        self
    }

    /// Builder method to set the derivation policy.
    pub fn with_policy(mut self, policy: DerivationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builder method to set the task settings.
    pub fn with_task_settings(mut self, task: TaskSettings) -> Self {
        self.task = task;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}
