//! # List Cache Registry
//!
//! Composition root for the caches: one store per entity kind, built once
//! from the configuration and handed to consumers as `Arc`s.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::entity::{Customer, Entity, Lead, Order};
use super::key::KeyDeriver;
use super::persistence::{PersistentCache, SnapshotBackend};
use super::store::{CacheStore, CacheStoreStats};
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::CacheConfig;

/// Per-kind statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCacheStats {
    pub orders: CacheStoreStats,
    pub leads: CacheStoreStats,
    pub customers: CacheStoreStats,
}

impl ListCacheStats {
    pub fn total_entries(&self) -> usize {
        self.orders.entries + self.leads.entries + self.customers.entries
    }
}

/// The application's list caches
#[derive(Debug, Clone)]
pub struct ListCaches {
    pub orders: Arc<CacheStore<Order>>,
    pub leads: Arc<CacheStore<Lead>>,
    pub customers: Arc<CacheStore<Customer>>,
    max_key_length: usize,
}

impl ListCaches {
    /// Build the caches from configuration using the wall clock
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build the caches from configuration with an explicit time source
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let ttl = config.default_ttl;
        Self {
            orders: Arc::new(CacheStore::with_clock(ttl, clock.clone())),
            leads: Arc::new(CacheStore::with_clock(ttl, clock.clone())),
            customers: Arc::new(CacheStore::with_clock(ttl, clock)),
            max_key_length: config.max_key_length,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.orders.ttl()
    }

    /// Key deriver for entity kind `T`, namespaced by its collection name
    pub fn key_deriver<T: Entity>(&self) -> KeyDeriver {
        KeyDeriver::new(T::COLLECTION).with_max_length(self.max_key_length)
    }

    /// Clear every store
    pub fn invalidate_all(&self) {
        self.orders.clear();
        self.leads.clear();
        self.customers.clear();
        info!("all list caches cleared");
    }

    pub fn stats(&self) -> ListCacheStats {
        ListCacheStats {
            orders: self.orders.stats(),
            leads: self.leads.stats(),
            customers: self.customers.stats(),
        }
    }

    /// Wrap every store in a `PersistentCache` and hydrate it from `backend`
    pub async fn open_persistent(&self, backend: Arc<dyn SnapshotBackend>) -> PersistentListCaches {
        PersistentListCaches {
            orders: PersistentCache::open(self.orders.clone(), backend.clone()).await,
            leads: PersistentCache::open(self.leads.clone(), backend.clone()).await,
            customers: PersistentCache::open(self.customers.clone(), backend).await,
        }
    }
}

/// The list caches with snapshot persistence attached
pub struct PersistentListCaches {
    pub orders: PersistentCache<Order>,
    pub leads: PersistentCache<Lead>,
    pub customers: PersistentCache<Customer>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::entry::Pagination;
    use crate::caching::persistence::MemorySnapshotBackend;
    use crate::caching::query::ListQuery;
    use crate::core::clock::ManualClock;

    fn lead(id: &str) -> Lead {
        Lead {
            id: id.to_string(),
            name: "Kiran".to_string(),
            phone: "+919999999999".to_string(),
            status: "new".to_string(),
            source: None,
            city_id: None,
            notes: None,
        }
    }

    #[test]
    fn test_stores_share_ttl_and_are_independent() {
        let config = CacheConfig {
            default_ttl: Duration::from_secs(30),
            ..Default::default()
        };
        let caches = ListCaches::from_config(&config);
        assert_eq!(caches.ttl(), Duration::from_secs(30));
        assert_eq!(caches.customers.ttl(), Duration::from_secs(30));

        let key = ListQuery::new().page(1).cache_key_with(&caches.key_deriver::<Lead>());
        caches.leads.set(key.clone(), vec![lead("l-1")], Pagination::new(1, 1, 20));

        assert_eq!(caches.stats().leads.entries, 1);
        assert_eq!(caches.stats().orders.entries, 0);
        assert!(key.as_str().starts_with("leads:"));
    }

    #[test]
    fn test_invalidate_all() {
        let caches = ListCaches::with_clock(&CacheConfig::default(), Arc::new(ManualClock::default()));
        caches.leads.set("a".into(), vec![lead("l-1")], Pagination::default());
        caches.leads.set("b".into(), vec![], Pagination::default());

        caches.invalidate_all();
        assert_eq!(caches.stats().total_entries(), 0);
    }

    #[tokio::test]
    async fn test_open_persistent_hydrates_every_kind() {
        let backend: Arc<dyn SnapshotBackend> = Arc::new(MemorySnapshotBackend::new());
        let config = CacheConfig::default();

        let first = ListCaches::from_config(&config).open_persistent(backend.clone()).await;
        first.leads.set("k".into(), vec![lead("l-1")], Pagination::new(1, 1, 20)).await;

        let caches = ListCaches::from_config(&config);
        let _persistent = caches.open_persistent(backend).await;
        assert_eq!(caches.leads.len(), 1);
        assert!(caches.orders.is_empty());
    }
}
