//! # List Cache Store
//!
//! In-memory cache of paginated collections for one entity kind.
//!
//! Each entry holds one page of results for one `CacheKey`. Entries expire
//! lazily: a read that finds an entry older than the TTL removes it and
//! reports a miss. There is no background sweep.
//!
//! Besides plain `get`/`set`, the store supports point mutations that keep
//! every cached page consistent after a local create, edit or delete:
//! - `update_entity` patches the record wherever it appears,
//! - `remove_entity` drops it everywhere and decrements the affected totals,
//! - `add_entity` prepends a new record to one page or to every page.
//!
//! Point mutations never refresh an entry's timestamp, so an edited page
//! still expires on its original schedule.
//!
//! ## Concurrency
//! Every public operation takes the store's single mutex for its whole
//! duration and never performs I/O while holding it, so a mutation is
//! observed either entirely or not at all. Concurrent fetches for the same
//! key race only at `set`, where the last write wins.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::entity::Entity;
use super::entry::{CacheEntry, Page, Pagination};
use super::key::CacheKey;
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::DEFAULT_TTL;

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStoreStats {
    /// Number of entries currently held (fresh or not yet observed stale)
    pub entries: usize,

    /// Reads that returned a fresh entry
    pub hits: u64,

    /// Reads that found nothing or an expired entry
    pub misses: u64,

    /// Entries removed because a read found them expired
    pub expired_evictions: u64,

    /// Calls to `set`
    pub writes: u64,

    /// Entries removed by `invalidate`
    pub invalidations: u64,
}

impl CacheStoreStats {
    /// Fraction of reads that hit, 0.0 before the first read
    pub fn hit_ratio(&self) -> f64 {
        let reads = self.hits + self.misses;
        if reads == 0 {
            0.0
        } else {
            self.hits as f64 / reads as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired_evictions: AtomicU64,
    writes: AtomicU64,
    invalidations: AtomicU64,
}

/// Keyed page cache for entity kind `T`
pub struct CacheStore<T: Entity> {
    /// Namespace used in logs and snapshot names
    name: String,

    ttl: Duration,

    clock: Arc<dyn Clock>,

    entries: Mutex<HashMap<CacheKey, CacheEntry<T>>>,

    counters: Counters,
}

impl<T: Entity> CacheStore<T> {
    /// Create a store using the wall clock and the default 5 minute TTL
    pub fn new() -> Self {
        Self::with_clock(DEFAULT_TTL, Arc::new(SystemClock))
    }

    /// Create a store with an explicit TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a store with an explicit TTL and time source
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: T::COLLECTION.to_string(),
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a page.
    ///
    /// Returns a copy of the items and pagination when the entry exists and
    /// `now - timestamp <= ttl`. An expired entry is deleted and reported
    /// as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<Page<T>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let fresh = match entries.get(key) {
            Some(entry) => entry.is_fresh(now, self.ttl),
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(cache = %self.name, key = %key, "cache miss");
                return None;
            }
        };

        if !fresh {
            entries.remove(key);
            self.counters.expired_evictions.fetch_add(1, Ordering::Relaxed);
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            debug!(cache = %self.name, key = %key, "cache entry expired, evicted");
            return None;
        }

        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        debug!(cache = %self.name, key = %key, "cache hit");
        entries.get(key).map(CacheEntry::to_page)
    }

    /// Store a freshly fetched page, replacing whatever was there
    pub fn set(&self, key: CacheKey, items: Vec<T>, pagination: Pagination) {
        let entry = CacheEntry::new(items, pagination, self.clock.now());
        debug!(cache = %self.name, key = %key, items = entry.items.len(), "cache set");

        self.entries.lock().insert(key, entry);
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Store a page returned by the fetch layer
    pub fn set_page(&self, key: CacheKey, page: Page<T>) {
        self.set(key, page.items, page.pagination);
    }

    /// Drop one entry, or every entry when `key` is `None`
    pub fn invalidate(&self, key: Option<&CacheKey>) {
        let mut entries = self.entries.lock();
        let removed = match key {
            Some(key) => usize::from(entries.remove(key).is_some()),
            None => {
                let count = entries.len();
                entries.clear();
                info!(cache = %self.name, entries = count, "cache cleared");
                count
            }
        };
        self.counters.invalidations.fetch_add(removed as u64, Ordering::Relaxed);
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.invalidate(None);
    }

    /// Patch the record `id` in every cached page that contains it.
    ///
    /// Totals and timestamps are left untouched. Returns the number of
    /// pages that changed.
    pub fn update_entity(&self, id: &str, patch: &T::Patch) -> usize {
        let mut entries = self.entries.lock();
        let mut touched = 0;

        for entry in entries.values_mut() {
            let mut matched = false;
            for item in entry.items.iter_mut().filter(|item| item.id() == id) {
                item.apply_patch(patch);
                matched = true;
            }
            if matched {
                touched += 1;
            }
        }

        debug!(cache = %self.name, id, pages = touched, "entity updated");
        touched
    }

    /// Remove the record `id` from every cached page, decrementing each
    /// affected page's total by one (never below zero). Returns the number
    /// of pages that changed.
    pub fn remove_entity(&self, id: &str) -> usize {
        let mut entries = self.entries.lock();
        let mut touched = 0;

        for entry in entries.values_mut() {
            let before = entry.items.len();
            entry.items.retain(|item| item.id() != id);
            if entry.items.len() != before {
                entry.pagination.total = entry.pagination.total.saturating_sub(1);
                touched += 1;
            }
        }

        debug!(cache = %self.name, id, pages = touched, "entity removed");
        touched
    }

    /// Prepend a new record.
    ///
    /// With a key, only that page is touched, and only if it exists. Without
    /// one, the record is prepended to every cached page regardless of the
    /// page's filters, so it shows up immediately in every open view until
    /// the next refetch or expiry. Pages that already hold the id are left
    /// alone, which makes repeated calls idempotent. Returns the number of
    /// pages that changed.
    pub fn add_entity(&self, item: T, key: Option<&CacheKey>) -> usize {
        let mut entries = self.entries.lock();

        let touched = match key {
            Some(key) => match entries.get_mut(key) {
                Some(entry) => usize::from(prepend_if_absent(entry, &item)),
                None => 0,
            },
            None => entries
                .values_mut()
                .map(|entry| usize::from(prepend_if_absent(entry, &item)))
                .sum(),
        };

        debug!(cache = %self.name, id = item.id(), pages = touched, "entity added");
        touched
    }

    /// Read-through lookup.
    ///
    /// Returns the fresh cached page for `key` if there is one. Otherwise
    /// awaits `fetch`, stores its result under `key` and returns it. The lock
    /// is not held while the fetch is pending; a fetch error is returned as
    /// is and nothing is cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &CacheKey, fetch: F) -> Result<Page<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
    {
        if let Some(page) = self.get(key) {
            return Ok(page);
        }

        let page = fetch().await?;
        self.set(key.clone(), page.items.clone(), page.pagination);
        Ok(page)
    }

    /// Number of entries held, including ones that are stale but not yet read
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Keys currently held, sorted
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Whether the entry for `key` exists and is fresh, without counting a
    /// read or evicting anything
    pub fn contains_fresh(&self, key: &CacheKey) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .get(key)
            .map(|entry| entry.is_fresh(now, self.ttl))
            .unwrap_or(false)
    }

    /// Copy of every entry with its original timestamp
    pub fn snapshot(&self) -> BTreeMap<CacheKey, CacheEntry<T>> {
        self.entries
            .lock()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Replace the store's contents with previously captured entries.
    ///
    /// Timestamps are kept, so restored entries expire on their original
    /// schedule when read.
    pub fn restore(&self, snapshot: BTreeMap<CacheKey, CacheEntry<T>>) {
        let count = snapshot.len();
        *self.entries.lock() = snapshot.into_iter().collect();
        info!(cache = %self.name, entries = count, "cache restored");
    }

    /// Drop every entry that is already expired. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now, self.ttl));
        let purged = before - entries.len();

        self.counters.expired_evictions.fetch_add(purged as u64, Ordering::Relaxed);
        if purged > 0 {
            debug!(cache = %self.name, purged, "purged expired entries");
        }
        purged
    }

    pub fn stats(&self) -> CacheStoreStats {
        CacheStoreStats {
            entries: self.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            expired_evictions: self.counters.expired_evictions.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
        }
    }
}

impl<T: Entity> Default for CacheStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> std::fmt::Debug for CacheStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

fn prepend_if_absent<T: Entity>(entry: &mut CacheEntry<T>, item: &T) -> bool {
    if entry.items.iter().any(|existing| existing.id() == item.id()) {
        return false;
    }
    entry.items.insert(0, item.clone());
    entry.pagination.total += 1;
    true
}
