//! # Snapshot Persistence
//!
//! Optional durability for list caches. A `PersistentCache` wraps a
//! `CacheStore` and writes a JSON snapshot of the whole store through a
//! `SnapshotBackend` after every write, and hydrates the store from the last
//! snapshot when opened.
//!
//! Persistence is an optimization only. A missing, unreadable or corrupt
//! snapshot means an empty cache, and a failed write is logged and otherwise
//! ignored, so the cache operations themselves never fail. Expiry is still
//! decided from the stored timestamps at read time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::entity::Entity;
use super::entry::{CacheEntry, Page, Pagination};
use super::key::CacheKey;
use super::store::CacheStore;
use crate::core::error::{CacheError, CacheResult};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Distinguishes temp files of concurrent saves within one process
static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Durable key-value storage for serialized snapshots, one per namespace
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Read the snapshot for `namespace`, `None` if there is none
    async fn load(&self, namespace: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Replace the snapshot for `namespace`
    async fn save(&self, namespace: &str, bytes: &[u8]) -> CacheResult<()>;

    /// Delete the snapshot for `namespace` (no error if absent)
    async fn remove(&self, namespace: &str) -> CacheResult<()>;
}

/// One JSON file per namespace inside a directory
#[derive(Debug, Clone)]
pub struct FileSnapshotBackend {
    directory: PathBuf,
}

impl FileSnapshotBackend {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, namespace: &str) -> PathBuf {
        let file_name: String = namespace
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.directory.join(format!("{}.json", file_name))
    }
}

#[async_trait]
impl SnapshotBackend for FileSnapshotBackend {
    async fn load(&self, namespace: &str) -> CacheResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(namespace)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, namespace: &str, bytes: &[u8]) -> CacheResult<()> {
        tokio::fs::create_dir_all(&self.directory).await?;

        // Each save gets its own temp file; the rename is the only step that
        // touches the shared path.
        let path = self.path_for(namespace);
        let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{}.{}.tmp", std::process::id(), sequence));
        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, namespace: &str) -> CacheResult<()> {
        match tokio::fs::remove_file(self.path_for(namespace)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process backend, mostly for tests
#[derive(Debug, Default, Clone)]
pub struct MemorySnapshotBackend {
    snapshots: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemorySnapshotBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored bytes for a namespace
    pub fn raw(&self, namespace: &str) -> Option<Vec<u8>> {
        self.snapshots.lock().get(namespace).cloned()
    }

    /// Overwrite the stored bytes for a namespace
    pub fn put_raw(&self, namespace: &str, bytes: Vec<u8>) {
        self.snapshots.lock().insert(namespace.to_string(), bytes);
    }
}

#[async_trait]
impl SnapshotBackend for MemorySnapshotBackend {
    async fn load(&self, namespace: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(self.raw(namespace))
    }

    async fn save(&self, namespace: &str, bytes: &[u8]) -> CacheResult<()> {
        self.put_raw(namespace, bytes.to_vec());
        Ok(())
    }

    async fn remove(&self, namespace: &str) -> CacheResult<()> {
        self.snapshots.lock().remove(namespace);
        Ok(())
    }
}

/// Serialized form of a whole store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub entries: BTreeMap<CacheKey, CacheEntry<T>>,
}

impl<T: Serialize + DeserializeOwned> Snapshot<T> {
    pub fn new(entries: BTreeMap<CacheKey, CacheEntry<T>>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            entries,
        }
    }

    pub fn to_bytes(&self) -> CacheResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode and check the format version
    pub fn from_bytes(bytes: &[u8]) -> CacheResult<Self> {
        let snapshot: Snapshot<T> = serde_json::from_slice(bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CacheError::persistence(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        Ok(snapshot)
    }
}

/// A `CacheStore` whose contents survive restarts.
///
/// Shareable behind an `Arc`. Writes are serialized per cache, so the last
/// snapshot taken is always the last one saved.
pub struct PersistentCache<T: Entity> {
    store: Arc<CacheStore<T>>,
    backend: Arc<dyn SnapshotBackend>,
    namespace: String,
    write_lock: tokio::sync::Mutex<()>,
    /// Whether the backend holds a snapshot for this namespace
    persisted: AtomicBool,
}

impl<T> PersistentCache<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    /// Wrap `store` and hydrate it from the backend.
    ///
    /// The namespace is the store's name. A missing snapshot leaves the store
    /// as it is; an unreadable one is logged and the store starts empty.
    pub async fn open(store: Arc<CacheStore<T>>, backend: Arc<dyn SnapshotBackend>) -> Self {
        let namespace = store.name().to_string();
        let cache = Self {
            store,
            backend,
            namespace,
            write_lock: tokio::sync::Mutex::new(()),
            persisted: AtomicBool::new(false),
        };
        cache.hydrate().await;
        cache
    }

    async fn hydrate(&self) {
        let bytes = match self.backend.load(&self.namespace).await {
            Ok(Some(bytes)) => {
                self.persisted.store(true, Ordering::Release);
                bytes
            }
            Ok(None) => {
                debug!(cache = %self.namespace, "no snapshot to restore");
                return;
            }
            Err(e) => {
                warn!(cache = %self.namespace, error = %e, "failed to read snapshot, starting empty");
                return;
            }
        };

        match Snapshot::<T>::from_bytes(&bytes) {
            Ok(snapshot) => {
                info!(cache = %self.namespace, saved_at = %snapshot.saved_at, "restoring snapshot");
                self.store.restore(snapshot.entries);
            }
            Err(e) => {
                warn!(cache = %self.namespace, error = %e, "discarding unreadable snapshot");
                self.store.clear();
            }
        }
    }

    /// The wrapped store, for reads and for sharing with other consumers
    pub fn store(&self) -> &Arc<CacheStore<T>> {
        &self.store
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, key: &CacheKey) -> Option<Page<T>> {
        self.store.get(key)
    }

    pub async fn set(&self, key: CacheKey, items: Vec<T>, pagination: Pagination) {
        self.store.set(key, items, pagination);
        self.persist().await;
    }

    pub async fn invalidate(&self, key: Option<&CacheKey>) {
        self.store.invalidate(key);
        self.persist().await;
    }

    pub async fn update_entity(&self, id: &str, patch: &T::Patch) -> usize {
        let touched = self.store.update_entity(id, patch);
        if touched > 0 {
            self.persist().await;
        }
        touched
    }

    pub async fn remove_entity(&self, id: &str) -> usize {
        let touched = self.store.remove_entity(id);
        if touched > 0 {
            self.persist().await;
        }
        touched
    }

    pub async fn add_entity(&self, item: T, key: Option<&CacheKey>) -> usize {
        let touched = self.store.add_entity(item, key);
        if touched > 0 {
            self.persist().await;
        }
        touched
    }

    /// Write the current contents, reporting failures to the caller
    pub async fn flush(&self) -> CacheResult<()> {
        // Snapshot and save under one lock so saves land in snapshot order.
        let _guard = self.write_lock.lock().await;
        let snapshot = Snapshot::new(self.store.snapshot());
        let bytes = snapshot.to_bytes()?;
        self.backend.save(&self.namespace, &bytes).await?;
        self.persisted.store(true, Ordering::Release);
        debug!(cache = %self.namespace, entries = snapshot.entries.len(), bytes = bytes.len(), "snapshot written");
        Ok(())
    }

    /// Remove expired entries and rewrite the snapshot.
    ///
    /// Nothing is written when nothing expired and the backend has no
    /// snapshot for this cache yet.
    pub async fn prune(&self) -> CacheResult<usize> {
        let purged = self.store.purge_expired();
        if purged == 0 && !self.is_persisted() {
            debug!(cache = %self.namespace, "nothing to prune and no snapshot, skipping rewrite");
            return Ok(0);
        }
        self.flush().await?;
        Ok(purged)
    }

    /// Whether a snapshot was restored or written through this cache
    pub fn is_persisted(&self) -> bool {
        self.persisted.load(Ordering::Acquire)
    }

    /// Delete the persisted snapshot; the in-memory entries stay
    pub async fn forget(&self) -> CacheResult<()> {
        let _guard = self.write_lock.lock().await;
        self.backend.remove(&self.namespace).await?;
        self.persisted.store(false, Ordering::Release);
        Ok(())
    }

    async fn persist(&self) {
        if let Err(e) = self.flush().await {
            warn!(cache = %self.namespace, error = %e, "failed to persist snapshot");
        }
    }
}
