//! # Cache Key Derivation
//!
//! Maps a query-parameter object to a stable, opaque cache key.
//!
//! The canonical form drops `null` members, orders object members by name
//! (at every nesting level) and encodes scalars with serde_json's encoding.
//! Two parameter objects that differ only in member order or in absent/null
//! members therefore produce the same key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::core::config::DEFAULT_MAX_KEY_LENGTH;
use crate::core::error::CacheResult;

/// Opaque key identifying one query shape (filters, sort, page, size)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a parameter object. Pure and total.
    pub fn from_params(params: &Value) -> Self {
        let mut out = String::new();
        write_canonical(params, &mut out);
        Self(out)
    }

    /// Derive the key for any serializable query type. `None` fields
    /// serialize as `null` and are dropped like missing ones.
    pub fn try_from_serialize<P: Serialize + ?Sized>(params: &P) -> CacheResult<Self> {
        let value = serde_json::to_value(params)?;
        Ok(Self::from_params(&value))
    }

    /// Wrap an already derived key string
    pub fn from_raw<S: Into<String>>(raw: S) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut members: Vec<(&String, &Value)> = map.iter().filter(|(_, v)| !v.is_null()).collect();
            members.sort_by(|(a, _), (b, _)| a.cmp(b));

            out.push('{');
            for (index, (name, member)) in members.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(member, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Namespaced key derivation with a length bound.
///
/// Keys look like `orders:{"page":1}`; anything longer than `max_length`
/// is replaced by `orders:hash:<sha256 hex>` so stored keys stay bounded.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    prefix: String,
    max_length: usize,
}

impl KeyDeriver {
    /// Create a deriver for one entity namespace
    pub fn new<S: Into<String>>(namespace: S) -> Self {
        Self {
            prefix: format!("{}:", namespace.into()),
            max_length: DEFAULT_MAX_KEY_LENGTH,
        }
    }

    /// Set custom max length
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derive a namespaced key from a parameter object
    pub fn derive(&self, params: &Value) -> CacheKey {
        let canonical = CacheKey::from_params(params);
        self.bound(format!("{}{}", self.prefix, canonical))
    }

    /// Derive a namespaced key from any serializable query type
    pub fn derive_from<P: Serialize + ?Sized>(&self, params: &P) -> CacheResult<CacheKey> {
        let value = serde_json::to_value(params)?;
        Ok(self.derive(&value))
    }

    fn bound(&self, key: String) -> CacheKey {
        if key.len() <= self.max_length {
            return CacheKey(key);
        }

        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        CacheKey(format!("{}hash:{}", self.prefix, hex::encode(hasher.finalize())))
    }
}
