//! # Error Handling Module
//!
//! Error types for the list cache, built with the `thiserror` crate.
//!
//! The cache operations themselves (`get`, `set`, `invalidate` and the point
//! mutations) are total and never produce an error: a missing or expired key
//! is a miss, an unknown id is a no-op. Errors only show up at the edges of
//! the crate:
//! - loading and validating configuration,
//! - parsing list payloads returned by the remote API,
//! - deriving a key from an arbitrary `Serialize` value,
//! - reading and writing persisted snapshots.
//!
//! ## The `?` Operator
//! Every fallible function returns `CacheResult<T>`, so errors from serde,
//! the filesystem or YAML parsing convert automatically through the `From`
//! implementations generated by `#[from]`:
//! ```rust,ignore
//! async fn load(path: &Path) -> CacheResult<CacheConfig> {
//!     let content = tokio::fs::read_to_string(path).await?; // io::Error -> CacheError::Io
//!     let config = serde_yaml::from_str(&content)?;         // serde_yaml::Error -> CacheError::Yaml
//!     Ok(config)
//! }
//! ```

use thiserror::Error;

/// Result type used throughout the crate
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised at the boundaries of the list cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A list payload from the remote API did not have the expected shape
    #[error("Malformed list envelope: {message}")]
    Envelope { message: String },

    /// Snapshot persistence failed (corrupt data, version mismatch, ...)
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML configuration parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Filesystem errors from the snapshot backend or config loading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an envelope parsing error
    pub fn envelope<S: Into<String>>(message: S) -> Self {
        Self::Envelope {
            message: message.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Whether the error came from the snapshot layer rather than from
    /// configuration or payload parsing
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CacheError::config("ttl must be non-zero");
        assert_eq!(error.to_string(), "Configuration error: ttl must be non-zero");

        let error = CacheError::envelope("missing data.orders");
        assert_eq!(error.to_string(), "Malformed list envelope: missing data.orders");
    }

    #[test]
    fn test_from_conversions() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: CacheError = json_err.into();
        assert!(matches!(error, CacheError::Serialization(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: CacheError = io_err.into();
        assert!(error.is_persistence());
        assert!(!CacheError::config("x").is_persistence());
    }
}
