//! TTL-bounded, direction-insensitive distance cache with write-through
//! persistence.
//!
//! The whole cache lives in memory and is mirrored to a [`KeyValueStore`]
//! under a single key after every write. Each write stores both directions
//! of the pair. Expired entries are skipped by readers and never evicted.
//!
//! A write updates memory and serializes the snapshot under the entry lock,
//! then releases it before touching the store, so readers never wait on
//! storage I/O. Snapshots carry a revision and a stale one is never written
//! over a newer one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::KeyValueStore;

/// Store key holding the serialized snapshot.
pub const CACHE_STORE_KEY: &str = "distanceCacheV1";

const PAIR_SEPARATOR: &str = "__|__";

/// Order-dependent key for a pair; the cache writes both orders.
pub fn pair_key(from: &str, to: &str) -> String {
    format!("{}{}{}", from, PAIR_SEPARATOR, to)
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub km: f64,
    #[serde(rename = "ts")]
    pub timestamp_ms: i64,
}

impl CacheEntry {
    /// An entry is fresh until it is strictly older than `ttl`.
    pub fn is_fresh(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp_ms) <= ttl_ms
    }
}

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<String, CacheEntry>,
    revision: u64,
}

/// A serialized snapshot waiting to be written to the store.
pub struct PendingSnapshot {
    revision: u64,
    data: String,
    store: Arc<dyn KeyValueStore>,
    persisted: Arc<Mutex<u64>>,
}

impl PendingSnapshot {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Write the snapshot unless a newer revision already landed. Blocks on
    /// store I/O; failures are logged and swallowed.
    pub fn persist(self) {
        let mut persisted = self.persisted.lock().unwrap_or_else(|e| e.into_inner());
        if *persisted >= self.revision {
            debug!(revision = self.revision, latest = *persisted, "skipping superseded cache snapshot");
            return;
        }

        match self.store.set(CACHE_STORE_KEY, &self.data) {
            Ok(()) => *persisted = self.revision,
            Err(err) => warn!(error = %err, revision = self.revision, "failed to persist distance cache"),
        }
    }

    /// [`persist`](Self::persist) on the blocking pool, for async callers.
    pub async fn persist_blocking(self) {
        if let Err(err) = tokio::task::spawn_blocking(move || self.persist()).await {
            warn!(error = %err, "distance cache persistence task failed");
        }
    }
}

pub struct DistanceCache {
    entries: RwLock<Entries>,
    store: Arc<dyn KeyValueStore>,
    persisted: Arc<Mutex<u64>>,
}

impl std::fmt::Debug for DistanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl DistanceCache {
    /// Load the snapshot from `store` once. A missing snapshot starts empty;
    /// an unreadable or corrupt one is logged and also starts empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let map = match read_snapshot(store.as_ref()) {
            Ok(map) => {
                debug!(entries = map.len(), "loaded distance cache snapshot");
                map
            }
            Err(err) => {
                warn!(error = %err, "ignoring unreadable distance cache snapshot");
                HashMap::new()
            }
        };

        Self {
            entries: RwLock::new(Entries { map, revision: 0 }),
            store,
            persisted: Arc::new(Mutex::new(0)),
        }
    }

    /// Raw lookup in either direction, ignoring age.
    pub fn get(&self, from: &str, to: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .map
            .get(&pair_key(from, to))
            .or_else(|| entries.map.get(&pair_key(to, from)))
            .copied()
    }

    /// Lookup in either direction, skipping entries older than `ttl`.
    pub fn get_fresh(&self, from: &str, to: &str, ttl: Duration, now_ms: i64) -> Option<CacheEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        [pair_key(from, to), pair_key(to, from)]
            .iter()
            .filter_map(|key| entries.map.get(key))
            .find(|entry| entry.is_fresh(now_ms, ttl))
            .copied()
    }

    pub fn put(&self, from: &str, to: &str, km: f64) {
        self.put_at(from, to, km, now_ms());
    }

    /// Store `km` for both directions with the given timestamp and flush the
    /// snapshot. Persistence failures are logged and swallowed; the
    /// in-memory entry stays valid for the life of the process.
    pub fn put_at(&self, from: &str, to: &str, km: f64, timestamp_ms: i64) {
        if let Some(snapshot) = self.record_at(from, to, km, timestamp_ms) {
            snapshot.persist();
        }
    }

    /// Update memory only and hand back the snapshot to persist. `None` if
    /// the snapshot could not be serialized.
    pub fn record(&self, from: &str, to: &str, km: f64) -> Option<PendingSnapshot> {
        self.record_at(from, to, km, now_ms())
    }

    pub fn record_at(&self, from: &str, to: &str, km: f64, timestamp_ms: i64) -> Option<PendingSnapshot> {
        let entry = CacheEntry { km, timestamp_ms };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.map.insert(pair_key(from, to), entry);
        entries.map.insert(pair_key(to, from), entry);
        entries.revision += 1;

        match serde_json::to_string(&entries.map) {
            Ok(data) => Some(PendingSnapshot {
                revision: entries.revision,
                data,
                store: Arc::clone(&self.store),
                persisted: Arc::clone(&self.persisted),
            }),
            Err(err) => {
                warn!(error = %err, from, to, "failed to serialize distance cache");
                None
            }
        }
    }

    /// Number of stored directed entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fresh_len(&self, ttl: Duration, now_ms: i64) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .map
            .values()
            .filter(|entry| entry.is_fresh(now_ms, ttl))
            .count()
    }
}

fn read_snapshot(store: &dyn KeyValueStore) -> Result<HashMap<String, CacheEntry>, StoreError> {
    match store.get(CACHE_STORE_KEY)? {
        Some(data) => Ok(serde_json::from_str(&data)?),
        None => Ok(HashMap::new()),
    }
}
