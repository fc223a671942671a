//! Configuration for a lineage graph.
//!
//! Configuration is read from TOML and then overridden from the
//! environment. Lookup order for the file:
//!
//! 1. an explicit path passed to [`GraphConfig::load`]
//! 2. `LINEAGE_CONFIG_PATH`
//! 3. `./lineage.toml`
//! 4. `<config dir>/lineage/config.toml` (e.g. `~/.config/lineage/config.toml`)
//!
//! When none exists the defaults are used.
//!
//! # Example
//!
//! ```toml
//! [cache]
//! enabled = true
//! query_cache_size = 1000
//!
//! [traversal]
//! max_path_length = 10
//! max_paths = 1000
//!
//! [build]
//! parallel = true
//! parallel_threshold = 256
//!
//! [storage]
//! node_cache_size = 50000
//!
//! [logging]
//! level = "info"
//! ```

use crate::error::{LineageError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// File name searched for in the working directory
pub const LOCAL_CONFIG_FILE: &str = "lineage.toml";

// Environment variable names
pub const ENV_CONFIG_PATH: &str = "LINEAGE_CONFIG_PATH";
pub const ENV_LOG_LEVEL: &str = "LINEAGE_LOG_LEVEL";
pub const ENV_CACHE_ENABLED: &str = "LINEAGE_CACHE_ENABLED";
pub const ENV_QUERY_CACHE_SIZE: &str = "LINEAGE_QUERY_CACHE_SIZE";
pub const ENV_MAX_PATH_LENGTH: &str = "LINEAGE_MAX_PATH_LENGTH";
pub const ENV_MAX_PATHS: &str = "LINEAGE_MAX_PATHS";
pub const ENV_PARALLEL_BUILD: &str = "LINEAGE_PARALLEL_BUILD";
pub const ENV_NODE_CACHE_SIZE: &str = "LINEAGE_NODE_CACHE_SIZE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub cache: CacheConfig,
    pub traversal: TraversalConfig,
    pub build: BuildConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Query cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub query_cache_size: usize,
}

/// Limits applied to path enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Default edge-count cap for `all_paths`
    pub max_path_length: usize,
    /// Upper bound on paths returned by one `all_paths` call
    pub max_paths: usize,
}

/// Graph construction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub parallel: bool,
    /// Below this many records the node pass runs sequentially
    pub parallel_threshold: usize,
}

/// Persistence settings for the hybrid backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Decoded nodes kept in the hybrid backend's LRU
    pub node_cache_size: usize,
    /// Directory for the filesystem blob store
    pub blob_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            query_cache_size: 1000,
        }
    }
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_path_length: 10,
            max_paths: 1000,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 256,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            node_cache_size: 50_000,
            blob_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl GraphConfig {
    /// Load from `path`, or from the first file found in the lookup order
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read or parsed, or if
    /// an environment override is malformed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(Self::discover) {
            Some(path) => Self::load_from_path(&path),
            None => {
                debug!("No configuration file found, using defaults");
                let mut config = Self::default();
                config.merge_env_vars()?;
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .map_err(|e| LineageError::config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml_str(&content)?;
        config.merge_env_vars()?;
        config.validate()?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parse TOML without applying environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| LineageError::config(format!("Failed to parse config file: {}", e)))
    }

    /// First existing file in the lookup order
    pub fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            return Some(PathBuf::from(path));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }

        Self::user_config_path().filter(|p| p.exists())
    }

    /// `<config dir>/lineage/config.toml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lineage").join("config.toml"))
    }

    /// Save configuration to a specific path atomically
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or written
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    LineageError::config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| LineageError::config(format!("Failed to serialize config: {}", e)))?;

        let temp_path = path.with_extension("toml.tmp");
        std::fs::write(&temp_path, content)
            .map_err(|e| LineageError::config(format!("Failed to write config file: {}", e)))?;
        std::fs::rename(&temp_path, path)
            .map_err(|e| LineageError::config(format!("Failed to rename config file: {}", e)))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(LineageError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if self.cache.enabled && self.cache.query_cache_size == 0 {
            return Err(LineageError::config(
                "query_cache_size must be greater than 0 when the cache is enabled",
            ));
        }

        if self.traversal.max_path_length == 0 {
            return Err(LineageError::config(
                "max_path_length must be greater than 0",
            ));
        }

        if self.traversal.max_paths == 0 {
            return Err(LineageError::config("max_paths must be greater than 0"));
        }

        if self.storage.node_cache_size == 0 {
            return Err(LineageError::config(
                "node_cache_size must be greater than 0",
            ));
        }

        debug!("Configuration validation passed");
        Ok(())
    }

    /// Merge environment variable overrides into the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    pub fn merge_env_vars(&mut self) -> Result<()> {
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            debug!("Overriding log level from environment: {}", level);
            self.logging.level = level.to_lowercase();
        }
        if let Some(enabled) = env_parse::<bool>(ENV_CACHE_ENABLED)? {
            self.cache.enabled = enabled;
        }
        if let Some(size) = env_parse::<usize>(ENV_QUERY_CACHE_SIZE)? {
            self.cache.query_cache_size = size;
        }
        if let Some(len) = env_parse::<usize>(ENV_MAX_PATH_LENGTH)? {
            self.traversal.max_path_length = len;
        }
        if let Some(max) = env_parse::<usize>(ENV_MAX_PATHS)? {
            self.traversal.max_paths = max;
        }
        if let Some(parallel) = env_parse::<bool>(ENV_PARALLEL_BUILD)? {
            self.build.parallel = parallel;
        }
        if let Some(size) = env_parse::<usize>(ENV_NODE_CACHE_SIZE)? {
            self.storage.node_cache_size = size;
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| LineageError::config(format!("Invalid value for {}: '{}'", key, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GraphConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.query_cache_size, 1000);
        assert_eq!(config.traversal.max_path_length, 10);
        assert_eq!(config.storage.node_cache_size, 50_000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GraphConfig::from_toml_str(
            r#"
            [cache]
            query_cache_size = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.query_cache_size, 42);
        assert!(config.cache.enabled);
        assert_eq!(config.traversal.max_paths, 1000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GraphConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = GraphConfig::default();
        config.traversal.max_path_length = 0;
        assert!(config.validate().is_err());

        let mut config = GraphConfig::default();
        config.cache.enabled = false;
        config.cache.query_cache_size = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = GraphConfig::from_toml_str("[cache\nenabled = ").unwrap_err();
        assert!(matches!(err, LineageError::Config(_)));
    }
}
