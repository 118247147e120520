//! Resolver configuration (nixpin.toml)
//!
//! Looked up in order: an explicit path, `./nixpin.toml`, then
//! `<config dir>/nixpin/config.toml`. Missing files yield defaults.

use crate::build_system::BuildStrategy;
use crate::registry::{DEFAULT_REGISTRY, MAX_ARCHIVE_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Project-local configuration file name
pub const CONFIG_FILE: &str = "nixpin.toml";

/// Upper bound for the automatic worker count
const MAX_AUTO_JOBS: usize = 8;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Resolver settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Base URL of the PyPI JSON API
    pub registry_url: String,

    /// Total deadline per request, in seconds
    pub timeout_secs: u64,

    /// Connection deadline per request, in seconds
    pub connect_timeout_secs: u64,

    /// Largest sdist that will be downloaded for inspection
    pub max_archive_bytes: u64,

    /// Parallel resolutions in a batch (0 = number of CPUs, capped)
    pub jobs: usize,

    /// Build dependency detection strategy
    pub build_strategy: BuildStrategy,

    /// Check downloaded sdists against their published digest
    pub verify_artifacts: bool,

    /// Extra PyPI name -> nixpkgs attribute overrides
    pub overrides: HashMap<String, String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_archive_bytes: MAX_ARCHIVE_SIZE,
            jobs: 0,
            build_strategy: BuildStrategy::default(),
            verify_artifacts: true,
            overrides: HashMap::new(),
        }
    }
}

impl ResolverConfig {
    /// Parse a config from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse a config from a string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ResolverConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `explicit`, else the first config file found in `cwd` or
    /// the user config dir, else defaults
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = cwd.join(CONFIG_FILE);
        if local.is_file() {
            return Self::from_file(&local);
        }

        if let Some(user) = user_config_path() {
            if user.is_file() {
                return Self::from_file(&user);
            }
        }

        Ok(Self::default())
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.registry_url.starts_with("http://") && !self.registry_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError(format!(
                "registry_url must be an http(s) URL, got {:?}",
                self.registry_url
            )));
        }

        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least one second".to_string(),
            ));
        }

        if self.max_archive_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "max_archive_bytes must be positive".to_string(),
            ));
        }

        for (name, attr) in &self.overrides {
            if name.trim().is_empty() || attr.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "override entries need a name and an attribute: {name:?} = {attr:?}"
                )));
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Worker count for batch resolution, never zero
    pub fn effective_jobs(&self) -> usize {
        if self.jobs > 0 {
            self.jobs
        } else {
            num_cpus::get().clamp(1, MAX_AUTO_JOBS)
        }
    }
}

/// `<config dir>/nixpin/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("nixpin").join("config.toml"))
}
