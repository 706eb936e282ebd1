//! # Cache Entries
//!
//! One cached page of a collection, its pagination metadata and the instant
//! it was written.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::core::error::{CacheError, CacheResult};

/// Pagination metadata returned by the backend alongside a page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    /// Total number of records matching the query, across all pages
    pub total: u64,

    /// 1-based page number
    pub page: u32,

    /// Page size
    pub limit: u32,
}

impl Pagination {
    pub fn new(total: u64, page: u32, limit: u32) -> Self {
        Self { total, page, limit }
    }

    /// Number of pages, zero when the page size is unknown
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }

    /// Whether a page follows this one
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }
}

/// A page of items as handed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self { items, pagination }
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Parse the backend's list payload:
    /// `{ "data": { "<collection>": [...], "pagination": {...} } }`
    pub fn from_envelope(mut envelope: Value, collection: &str) -> CacheResult<Self> {
        let data = envelope
            .get_mut("data")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| CacheError::envelope("missing `data` object"))?;

        let items = data
            .remove(collection)
            .ok_or_else(|| CacheError::envelope(format!("missing `data.{}`", collection)))?;
        if !items.is_array() {
            return Err(CacheError::envelope(format!("`data.{}` is not an array", collection)));
        }
        let items: Vec<T> = serde_json::from_value(items)?;

        let pagination = match data.remove("pagination") {
            Some(pagination) => serde_json::from_value(pagination)?,
            None => Pagination::new(items.len() as u64, 1, items.len() as u32),
        };

        Ok(Self { items, pagination })
    }
}

/// One stored page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,

    /// When the entry was written by `set`. Point mutations leave it alone.
    pub timestamp: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, timestamp: DateTime<Utc>) -> Self {
        Self {
            items,
            pagination,
            timestamp,
        }
    }

    /// Age of the entry at `now`. A timestamp in the future counts as zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.timestamp).to_std().unwrap_or(Duration::ZERO)
    }

    /// `now - timestamp <= ttl`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) <= ttl
    }
}

impl<T: Clone> CacheEntry<T> {
    /// Copy of the items and pagination
    pub fn to_page(&self) -> Page<T> {
        Page {
            items: self.items.clone(),
            pagination: self.pagination,
        }
    }
}
