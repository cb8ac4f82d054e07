//! Periodic refresh for `gitpix watch`

use std::collections::HashSet;

use tokio::time::{Duration, interval};

use crate::api::CommitSource;
use crate::cache::store::SnapshotStore;
use crate::error::Result;
use crate::gallery::Gallery;
use crate::models::ImageEntry;

/// Entries of `current` whose path and content were not in `previous`
pub fn new_entries(previous: &[ImageEntry], current: &[ImageEntry]) -> Vec<ImageEntry> {
    let seen: HashSet<(&str, &str)> = previous
        .iter()
        .map(|e| (e.path.as_str(), e.change_sha.as_str()))
        .collect();

    current
        .iter()
        .filter(|e| !seen.contains(&(e.path.as_str(), e.change_sha.as_str())))
        .cloned()
        .collect()
}

/// Tracks the last index to report what changed between refreshes
#[derive(Debug, Default)]
pub struct Watcher {
    previous: Option<Vec<ImageEntry>>,
}

impl Watcher {
    /// Create a watcher that reports everything on its first poll
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index once and return the entries not seen before
    pub async fn poll<S, P>(&mut self, gallery: &mut Gallery<S, P>) -> Result<Vec<ImageEntry>>
    where
        S: CommitSource,
        P: SnapshotStore,
    {
        let current = gallery.list_images().await?;
        let fresh = match &self.previous {
            Some(previous) => new_entries(previous, &current),
            None => current.clone(),
        };
        self.previous = Some(current);
        Ok(fresh)
    }

    /// Poll every `interval_secs` seconds forever, handing new entries to
    /// `on_new`. Failed refreshes are logged and retried on the next tick.
    pub async fn run<S, P, F>(&mut self, gallery: &mut Gallery<S, P>, interval_secs: u64, mut on_new: F)
    where
        S: CommitSource,
        P: SnapshotStore,
        F: FnMut(&[ImageEntry]),
    {
        let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

        loop {
            ticker.tick().await;

            match self.poll(gallery).await {
                Ok(fresh) if !fresh.is_empty() => on_new(&fresh),
                Ok(_) => tracing::debug!("No new images"),
                Err(e) => tracing::error!("Refresh failed: {}", e),
            }
        }
    }
}
