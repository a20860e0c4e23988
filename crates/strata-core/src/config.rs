//! Run configuration, loaded from `strata.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::scope::ScopeFilter;

/// Default config file looked up in the working directory.
pub const CONFIG_FILE: &str = "strata.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid cluster settings: {0}")]
    Cluster(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    pub scope: ScopeFilter,
    pub cluster: ClusterConfig,
    pub store: StoreConfig,
}

/// Clustering knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// File groups up to this size stay one `file` cluster.
    pub small_file_threshold: usize,
    /// Maximum members of a kind-split chunk.
    pub chunk_size: usize,
    /// Estimated downstream cost per member.
    pub cost_per_symbol: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            small_file_threshold: 3,
            chunk_size: 5,
            cost_per_symbol: 3000,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Cluster("chunk_size must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from("strata.db"),
        }
    }
}

impl StrataConfig {
    /// Load configuration from the given path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: StrataConfig = toml::from_str(&content)?;
        config.cluster.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else `strata.toml` in `dir` if present, else defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}
