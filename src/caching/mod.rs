//! # List Caching Module
//!
//! Client-side caching of paginated entity lists (orders, leads, customers).
//!
//! ## Flow
//! 1. A list view derives a `CacheKey` from its current `ListQuery`.
//! 2. It looks the key up in the `CacheStore` for its entity kind.
//! 3. On a miss it fetches the page from the API and stores it with `set`
//!    (or lets `get_or_fetch` do both).
//! 4. After a local create, edit or delete succeeds remotely, the caller
//!    pushes the change into the store with `add_entity`, `update_entity` or
//!    `remove_entity` so every cached page reflects it without a refetch.
//!
//! ## Architecture
//! - **key**: canonical key derivation from query parameters
//! - **query**: typed list query parameters
//! - **entry**: cached pages and pagination metadata
//! - **entity**: the `Entity` trait and the dashboard's record types
//! - **store**: the generic TTL store with point mutations
//! - **persistence**: optional snapshot persistence
//! - **registry**: one store per entity kind, built from configuration
//!
//! ## Usage Example
//! ```rust
//! use list_cache::caching::{CacheStore, ListQuery, Pagination, Record};
//!
//! let store: CacheStore<Record> = CacheStore::new();
//! let key = ListQuery::new().page(1).limit(20).cache_key();
//!
//! store.set(key.clone(), vec![Record::new("a")], Pagination::new(1, 1, 20));
//! store.add_entity(Record::new("b"), None);
//!
//! let page = store.get(&key).unwrap();
//! assert_eq!(page.items[0].id, "b");
//! assert_eq!(page.pagination.total, 2);
//! ```

pub mod entity;
pub mod entry;
pub mod key;
pub mod persistence;
pub mod query;
pub mod registry;
pub mod store;

pub use entity::{Customer, CustomerPatch, Entity, Lead, LeadPatch, Order, OrderPatch, OrderStatus, Record};
pub use entry::{CacheEntry, Page, Pagination};
pub use key::{CacheKey, KeyDeriver};
pub use persistence::{FileSnapshotBackend, MemorySnapshotBackend, PersistentCache, Snapshot, SnapshotBackend};
pub use query::{ListQuery, SortOrder};
pub use registry::{ListCacheStats, ListCaches, PersistentListCaches};
pub use store::{CacheStore, CacheStoreStats};
