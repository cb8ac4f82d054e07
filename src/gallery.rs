//! Gallery session: configuration, remote source and commit cache together

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};

use crate::api::CommitSource;
use crate::cache::store::{CachePersistence, SnapshotStore};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::{IndexBuilder, extension};
use crate::models::ImageEntry;
use crate::resolver::{CommitResolver, DetailCache, WriteEveryMiss};

/// One repository's image gallery
pub struct Gallery<S, P: SnapshotStore> {
    config: Config,
    builder: IndexBuilder,
    source: S,
    resolver: CommitResolver<WriteEveryMiss<P>>,
}

impl<S: CommitSource, P: SnapshotStore> Gallery<S, P> {
    /// Open a gallery, restoring the persisted commit cache for the
    /// configured repository.
    pub fn open(config: Config, source: S, store: P) -> Result<Self> {
        config.validate()?;

        let persistence = CachePersistence::new(store);
        let cache: DetailCache = persistence.restore(&config.repository, config.cache_capacity)?;
        let hook = WriteEveryMiss::new(persistence, &config.repository);

        Ok(Self {
            builder: config.index_builder(),
            config,
            source,
            resolver: CommitResolver::new(cache, hook),
        })
    }

    /// Active configuration
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Remote source
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Number of cached commit details
    pub fn cached_commits(&self) -> usize {
        self.resolver.cache().len()
    }

    /// Rebuild the current image list, newest first
    pub async fn list_images(&mut self) -> Result<Vec<ImageEntry>> {
        self.builder
            .build_index(&self.source, &mut self.resolver)
            .await
    }

    /// Switch to a new configuration and source.
    ///
    /// A different repository identity leaves the cache empty and deletes
    /// the old snapshot. A capacity change on the same repository keeps the
    /// in-memory entries in recency order, dropping the oldest if it shrank.
    pub fn reconfigure(&mut self, config: Config, source: S) -> Result<()> {
        config.validate()?;
        let mut cache = DetailCache::new(config.cache_capacity)?;

        if config.repository != self.config.repository {
            tracing::info!(
                "Repository changed from {} to {}, clearing commit cache",
                self.config.repository,
                config.repository
            );
            self.resolver.clear();
            self.resolver.hook_mut().set_scope(&config.repository);
            self.resolver.replace_cache(cache);
        } else if config.cache_capacity != self.resolver.cache().capacity() {
            for (sha, detail) in self.resolver.cache() {
                cache.put(sha.clone(), Arc::clone(detail));
            }
            self.resolver
                .hook()
                .persistence()
                .save(&config.repository, &cache);
            self.resolver.replace_cache(cache);
        }

        self.builder = config.index_builder();
        self.config = config;
        self.source = source;
        Ok(())
    }

    /// Drop the commit cache and its snapshot
    pub fn clear_cache(&mut self) {
        self.resolver.clear();
    }

    /// Upload an image, returning its entry.
    ///
    /// The file is stored as `{path_prefix}{year}/{unix_millis}.{ext}`.
    pub async fn upload(&self, file_name: &str, bytes: &[u8], now: DateTime<Utc>) -> Result<ImageEntry> {
        let filter = self.config.image_filter();
        if !filter.allows_extension(file_name) {
            return Err(Error::UnsupportedFile(format!(
                "{file_name} (allowed: {})",
                filter.extensions().join(", ")
            )));
        }
        let ext = extension(file_name).unwrap_or_default().to_lowercase();

        let path = upload_path(&self.config.path_prefix, now, &ext);
        let message = format!("Upload image: {file_name}");
        self.source.put_content(&path, bytes, &message).await?;

        Ok(ImageEntry {
            resolved_url: self.config.link_resolver().url_for(&path),
            path,
            change_sha: String::new(),
            committed_at: now,
        })
    }
}

/// Repository path for an upload made at `now`
pub fn upload_path(path_prefix: &str, now: DateTime<Utc>, ext: &str) -> String {
    let prefix = if path_prefix.is_empty() || path_prefix.ends_with('/') {
        path_prefix.to_string()
    } else {
        format!("{path_prefix}/")
    };
    format!("{}{}/{}.{}", prefix, now.year(), now.timestamp_millis(), ext)
}
