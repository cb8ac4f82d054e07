//! Cache-first commit detail lookups

use std::sync::Arc;

use crate::api::CommitSource;
use crate::cache::RecencyCache;
use crate::cache::store::{CachePersistence, SnapshotStore};
use crate::error::Result;
use crate::models::CommitDetail;

/// Commit details keyed by commit sha
pub type DetailCache = RecencyCache<String, Arc<CommitDetail>>;

/// Persistence strategy run after the resolver mutates its cache
pub trait PersistHook {
    /// Called after a fetched detail was inserted
    fn after_insert(&mut self, cache: &DetailCache);

    /// Called after the cache was cleared
    fn on_clear(&mut self) {}
}

/// Keep the cache in memory only
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersist;

impl PersistHook for NoPersist {
    fn after_insert(&mut self, _cache: &DetailCache) {}
}

/// Write the full snapshot after every cache miss
#[derive(Debug)]
pub struct WriteEveryMiss<S> {
    persistence: CachePersistence<S>,
    scope: String,
}

impl<S: SnapshotStore> WriteEveryMiss<S> {
    /// Persist under `scope` (the repository identity)
    pub fn new(persistence: CachePersistence<S>, scope: &str) -> Self {
        Self {
            persistence,
            scope: scope.to_string(),
        }
    }

    /// Current snapshot scope
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Retarget future writes to another scope
    pub fn set_scope(&mut self, scope: &str) {
        self.scope = scope.to_string();
    }

    /// Get the persistence adapter
    pub const fn persistence(&self) -> &CachePersistence<S> {
        &self.persistence
    }
}

impl<S: SnapshotStore> PersistHook for WriteEveryMiss<S> {
    fn after_insert(&mut self, cache: &DetailCache) {
        self.persistence.save(&self.scope, cache);
    }

    fn on_clear(&mut self) {
        self.persistence.clear(&self.scope);
    }
}

/// Resolves commit details through a bounded cache
pub struct CommitResolver<H = NoPersist> {
    cache: DetailCache,
    hook: H,
}

impl<H: PersistHook> CommitResolver<H> {
    /// Create a resolver over an existing (possibly restored) cache
    pub const fn new(cache: DetailCache, hook: H) -> Self {
        Self { cache, hook }
    }

    /// Get the detail of `sha`, fetching it from `source` on a cache miss.
    ///
    /// A miss inserts the fetched detail and runs the persistence hook
    /// before returning. Fetch failures propagate and leave the cache as is.
    pub async fn resolve<S: CommitSource>(&mut self, source: &S, sha: &str) -> Result<Arc<CommitDetail>> {
        if let Some(detail) = self.cache.get(sha) {
            tracing::debug!("Commit cache hit: {}", sha);
            return Ok(Arc::clone(detail));
        }

        tracing::debug!("Commit cache miss: {}", sha);
        let detail = Arc::new(source.get_commit_detail(sha).await?);

        if let Some((evicted, _)) = self.cache.put(sha.to_string(), Arc::clone(&detail)) {
            tracing::debug!("Evicted commit {} from cache", evicted);
        }
        self.hook.after_insert(&self.cache);

        Ok(detail)
    }

    /// Drop every cached detail
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hook.on_clear();
    }

    /// Swap in another cache, returning the previous one
    pub fn replace_cache(&mut self, cache: DetailCache) -> DetailCache {
        std::mem::replace(&mut self.cache, cache)
    }

    /// Get the cache
    pub const fn cache(&self) -> &DetailCache {
        &self.cache
    }

    /// Get the persistence hook
    pub const fn hook(&self) -> &H {
        &self.hook
    }

    /// Get the persistence hook mutably
    pub const fn hook_mut(&mut self) -> &mut H {
        &mut self.hook
    }
}
