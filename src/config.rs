//! Persisted configuration management.
//!
//! This module handles loading and saving duplicate-finder settings to a
//! platform-specific config file, so embedding applications can persist a
//! user's preferred hashing parameters between runs. The persisted form
//! mirrors [`FinderConfig`] minus the progress callback.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::duplicates::FinderConfig;
use crate::scanner::{Algorithm, HashError, DEFAULT_PARTIAL_SIZE, DEFAULT_START_POSITION};

fn default_recursive() -> bool {
    true
}

fn default_max_partial_size() -> u64 {
    DEFAULT_PARTIAL_SIZE
}

fn default_start_position() -> u64 {
    DEFAULT_START_POSITION
}

fn default_algorithm() -> String {
    Algorithm::default().name().to_string()
}

/// Persisted duplicate-finder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Optional glob pattern restricting which file names are scanned.
    #[serde(default)]
    pub name_filter: Option<String>,
    /// Whether to descend into subdirectories.
    #[serde(default = "default_recursive")]
    pub recursive: bool,
    /// Maximum number of content bytes read for a partial hash.
    #[serde(default = "default_max_partial_size")]
    pub max_partial_size: u64,
    /// Byte offset at which partial hashing starts.
    #[serde(default = "default_start_position")]
    pub start_position: u64,
    /// Hash algorithm name (e.g. "sha1", "blake3").
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Whether ambiguous partial-hash groups are re-verified with full hashes.
    #[serde(default)]
    pub test_partial_hash: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name_filter: None,
            recursive: true,
            max_partial_size: default_max_partial_size(),
            start_position: default_start_position(),
            algorithm: default_algorithm(),
            test_partial_hash: false,
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    ///
    /// Falls back to defaults if the file is missing or unreadable.
    pub fn load() -> Self {
        match Self::config_path().and_then(|p| Self::load_from(&p)) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load the configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save the configuration to the default platform-specific path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save the configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "partdupe", "partdupe")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.json"))
    }

    /// Build a [`FinderConfig`] from these settings.
    ///
    /// Fails with [`HashError::UnknownAlgorithm`] if the stored algorithm
    /// name is not recognised.
    pub fn to_finder_config(&self) -> Result<FinderConfig, HashError> {
        let algorithm: Algorithm = self.algorithm.parse()?;
        let mut config = FinderConfig::default()
            .with_recursive(self.recursive)
            .with_max_partial_size(self.max_partial_size)
            .with_start_position(self.start_position)
            .with_algorithm(algorithm)
            .with_test_partial_hash(self.test_partial_hash);
        if let Some(pattern) = &self.name_filter {
            config = config.with_name_filter(pattern.clone());
        }
        Ok(config)
    }
}
