//! # List Cache Library
//!
//! TTL-based, in-memory cache of paginated entity lists with optimistic
//! point mutations, used by the admin dashboard of a scrap collection
//! service to keep order, lead and customer list views responsive.
//!
//! ## What It Does
//! - Caches one page of results per distinct query shape (`CacheKey`)
//! - Expires pages lazily after a TTL (5 minutes by default)
//! - Applies local creates, edits and deletes to every cached page at once
//! - Optionally persists its contents across restarts
//!
//! ## Module Layout
//! - `core`: error types, configuration and the injectable clock
//! - `caching`: keys, queries, entries, the generic store, persistence and
//!   the per-entity registry
//! - `observability`: logging setup

/// Error types, configuration and time source
pub mod core;

/// The list cache itself
pub mod caching;

/// Logging setup
pub mod observability;

pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::config::{CacheConfig, PersistenceConfig};
pub use crate::core::error::{CacheError, CacheResult};

pub use caching::{CacheKey, CacheStore, Entity, ListCaches, ListQuery, Page, Pagination};
