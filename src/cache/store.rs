//! Cache snapshot persistence
//!
//! A snapshot is a JSON array of `[key, value]` pairs in recency order
//! (least recently used first), written under a key scoped to the repository
//! identity. Replaying it with `put` in read order rebuilds the same recency.
//! Every failure here is logged and swallowed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::RecencyCache;
use crate::error::Result;

/// Durable key-value storage for snapshots
pub trait SnapshotStore {
    /// Read a snapshot blob
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Write (or overwrite) a snapshot blob
    fn write(&self, key: &str, blob: &str) -> Result<()>;

    /// Delete a snapshot blob (no-op when absent)
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &S {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, blob: &str) -> Result<()> {
        (**self).write(key, blob)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-process snapshot store
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots
    pub fn len(&self) -> usize {
        self.blobs.borrow().len()
    }

    /// Whether no snapshot is stored
    pub fn is_empty(&self) -> bool {
        self.blobs.borrow().is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str) -> Result<()> {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

/// Storage key of the snapshot for a repository
pub fn snapshot_key(scope: &str) -> String {
    format!("commit_cache:{scope}")
}

/// Best-effort save/load of cache snapshots
#[derive(Debug)]
pub struct CachePersistence<S> {
    store: S,
}

impl<S: SnapshotStore> CachePersistence<S> {
    /// Wrap a snapshot store
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Get the underlying store
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Write the cache contents for `scope`.
    pub fn save<K, V>(&self, scope: &str, cache: &RecencyCache<K, V>)
    where
        K: Hash + Eq + Clone + Serialize,
        V: Serialize,
    {
        let entries: Vec<(&K, &V)> = cache.iter().collect();

        let blob = match serde_json::to_string(&entries) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!("Failed to serialize cache for {}: {}", scope, e);
                return;
            }
        };

        match self.store.write(&snapshot_key(scope), &blob) {
            Ok(()) => tracing::debug!("Saved {} cache entries for {}", entries.len(), scope),
            Err(e) => tracing::warn!("Failed to save cache for {}: {}", scope, e),
        }
    }

    /// Read the snapshot for `scope`, oldest entry first.
    ///
    /// Missing or unreadable snapshots yield an empty list.
    pub fn load<K, V>(&self, scope: &str) -> Vec<(K, V)>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let blob = match self.store.read(&snapshot_key(scope)) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to load cache for {}: {}", scope, e);
                return Vec::new();
            }
        };

        serde_json::from_str(&blob).unwrap_or_else(|e| {
            tracing::warn!("Ignoring corrupt cache snapshot for {}: {}", scope, e);
            Vec::new()
        })
    }

    /// Delete the snapshot for `scope`
    pub fn clear(&self, scope: &str) {
        if let Err(e) = self.store.remove(&snapshot_key(scope)) {
            tracing::warn!("Failed to delete cache for {}: {}", scope, e);
        }
    }

    /// Build a fresh cache and replay the snapshot for `scope` into it
    pub fn restore<K, V>(&self, scope: &str, capacity: usize) -> Result<RecencyCache<K, V>>
    where
        K: Hash + Eq + Clone + DeserializeOwned,
        V: DeserializeOwned,
    {
        let mut cache = RecencyCache::new(capacity)?;
        for (key, value) in self.load(scope) {
            cache.put(key, value);
        }
        tracing::debug!("Restored {} cache entries for {}", cache.len(), scope);
        Ok(cache)
    }
}
