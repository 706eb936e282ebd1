//! # Configuration Module
//!
//! Configuration for the list caches: TTL, key limits, persistence and
//! logging.
//!
//! ## Key Features
//! - YAML/JSON configuration parsing with serde
//! - Human readable durations (`"5m"`, `"90s"`) via `humantime-serde`
//! - Environment variable override support
//! - Validation with descriptive error messages

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::error::{CacheError, CacheResult};
use crate::observability::config::LogConfig;

/// Default time-to-live of a cached page
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default upper bound on stored key length
pub const DEFAULT_MAX_KEY_LENGTH: usize = 250;

/// Smallest accepted `max_key_length`; a hashed key needs at least this much
pub const MIN_KEY_LENGTH: usize = 80;

/// Top level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied uniformly to every entry of every store
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,

    /// Keys longer than this are replaced by a hash
    pub max_key_length: usize,

    /// Snapshot persistence
    pub persistence: PersistenceConfig,

    /// Logging
    pub logging: LogConfig,
}

/// Snapshot persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Persist cache contents across restarts
    pub enabled: bool,

    /// Directory holding one snapshot file per entity kind
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
            persistence: PersistenceConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from(".list-cache"),
        }
    }
}

impl CacheConfig {
    /// Load configuration from a YAML (or `.json`) file, apply environment
    /// overrides and validate
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CacheError::config(format!("Failed to read config file {}: {}", path.display(), e)))?;

        let mut config = if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            serde_json::from_str::<CacheConfig>(&content)?
        } else {
            serde_yaml::from_str::<CacheConfig>(&content)?
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string (no env overrides)
    pub fn from_yaml_str(content: &str) -> CacheResult<Self> {
        let config: CacheConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Variables follow the pattern `LIST_CACHE_<FIELD>`, for example
    /// `LIST_CACHE_DEFAULT_TTL=90s`.
    pub fn apply_env_overrides(&mut self) -> CacheResult<()> {
        use std::env;

        if let Ok(ttl) = env::var("LIST_CACHE_DEFAULT_TTL") {
            self.default_ttl = humantime::parse_duration(&ttl)
                .map_err(|e| CacheError::config(format!("Invalid LIST_CACHE_DEFAULT_TTL: {}", e)))?;
        }

        if let Ok(length) = env::var("LIST_CACHE_MAX_KEY_LENGTH") {
            self.max_key_length = length
                .parse()
                .map_err(|e| CacheError::config(format!("Invalid LIST_CACHE_MAX_KEY_LENGTH: {}", e)))?;
        }

        if let Ok(enabled) = env::var("LIST_CACHE_PERSISTENCE_ENABLED") {
            self.persistence.enabled = enabled
                .parse()
                .map_err(|e| CacheError::config(format!("Invalid LIST_CACHE_PERSISTENCE_ENABLED: {}", e)))?;
        }

        if let Ok(dir) = env::var("LIST_CACHE_PERSISTENCE_DIR") {
            self.persistence.directory = PathBuf::from(dir);
        }

        if let Ok(level) = env::var("LIST_CACHE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("LIST_CACHE_LOG_FORMAT") {
            self.logging.format = format
                .parse()
                .map_err(|e| CacheError::config(format!("Invalid LIST_CACHE_LOG_FORMAT: {}", e)))?;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> CacheResult<()> {
        if self.default_ttl.is_zero() {
            return Err(CacheError::config("default_ttl must be greater than zero"));
        }

        if self.max_key_length < MIN_KEY_LENGTH {
            return Err(CacheError::config(format!(
                "max_key_length must be at least {} (got {})",
                MIN_KEY_LENGTH, self.max_key_length
            )));
        }

        if self.persistence.enabled && self.persistence.directory.as_os_str().is_empty() {
            return Err(CacheError::config("persistence.directory must be set when persistence is enabled"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::config::LogFormat;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.max_key_length, 250);
        assert!(!config.persistence.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
default_ttl: 90s
max_key_length: 120
persistence:
  enabled: true
  directory: /tmp/list-cache
logging:
  level: debug
  format: Json
"#;
        let config = CacheConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.default_ttl, Duration::from_secs(90));
        assert_eq!(config.max_key_length, 120);
        assert!(config.persistence.enabled);
        assert_eq!(config.persistence.directory, PathBuf::from("/tmp/list-cache"));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = CacheConfig::from_yaml_str("default_ttl: 10m\n").unwrap();
        assert_eq!(config.default_ttl, Duration::from_secs(600));
        assert_eq!(config.max_key_length, DEFAULT_MAX_KEY_LENGTH);
    }

    #[test]
    fn test_validation_rejects_zero_ttl() {
        let err = CacheConfig::from_yaml_str("default_ttl: 0s\n").unwrap_err();
        assert!(matches!(err, CacheError::Configuration { .. }));
    }

    #[test]
    fn test_validation_rejects_short_keys() {
        let config = CacheConfig {
            max_key_length: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"default_ttl": "2m", "max_key_length": 200}}"#).unwrap();

        let config = CacheConfig::load_from_file(file.path()).await.unwrap();
        assert_eq!(config.max_key_length, 200);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = CacheConfig::load_from_file("/definitely/not/here.yaml").await.unwrap_err();
        assert!(matches!(err, CacheError::Configuration { .. }));
    }
}
