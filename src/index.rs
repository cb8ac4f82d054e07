//! Commit-derived image index
//!
//! The remote API has no "list files with history" call, so the current set
//! of images is rebuilt from a bounded window of recent commits. Each commit's
//! file changes are folded, newest first, into a path-keyed map; the walk
//! stops early once the map holds `max_entries` paths. The result is sorted by
//! commit time and truncated. Images only touched by commits outside the
//! window are not found.

use indexmap::IndexMap;

use crate::api::CommitSource;
use crate::error::Result;
use crate::links::LinkResolver;
use crate::models::{CommitDetail, CommitRef, FileStatus, ImageEntry};
use crate::resolver::{CommitResolver, PersistHook};

/// Number of recent commits scanned per build
pub const DEFAULT_WINDOW: usize = 20;

/// Number of images returned per build
pub const DEFAULT_MAX_ENTRIES: usize = 20;

/// Directory images are stored under
pub const DEFAULT_PATH_PREFIX: &str = "img/";

/// File extensions treated as images
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Selects which repository paths are images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFilter {
    path_prefix: String,
    extensions: Vec<String>,
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new(DEFAULT_PATH_PREFIX, DEFAULT_EXTENSIONS)
    }
}

impl ImageFilter {
    /// Create a filter. Extensions are matched case-insensitively, with or
    /// without a leading dot.
    pub fn new<I, T>(path_prefix: &str, extensions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            path_prefix: path_prefix.to_string(),
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    /// Required path prefix
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Allowed extensions (lowercase, without dot)
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether the file extension of `path` is allowed
    pub fn allows_extension(&self, path: &str) -> bool {
        extension(path).is_some_and(|ext| {
            self.extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
    }

    /// Whether `path` is an image under the prefix
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.path_prefix) && self.allows_extension(path)
    }
}

/// Extension of the last path segment
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next()?;
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// When a change to an already indexed path replaces the recorded entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpsertPolicy {
    /// Replace only when the change id differs and the commit is newer
    #[default]
    NewerWins,
    /// Replace whenever the change id differs, even from an older commit
    ChangeIdDiffers,
}

/// Builds the image index from recent commits
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    window: usize,
    max_entries: usize,
    filter: ImageFilter,
    links: LinkResolver,
    policy: UpsertPolicy,
}

impl IndexBuilder {
    /// Create a builder with default window, size and filter
    pub fn new(links: LinkResolver) -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_entries: DEFAULT_MAX_ENTRIES,
            filter: ImageFilter::default(),
            links,
            policy: UpsertPolicy::default(),
        }
    }

    /// Set how many recent commits are scanned
    pub const fn window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Set the maximum number of images returned
    pub const fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set the image filter
    pub fn filter(mut self, filter: ImageFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the upsert policy
    pub const fn policy(mut self, policy: UpsertPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Rebuild the current image list, newest first.
    ///
    /// Only a failure to list commits fails the build; commits whose detail
    /// cannot be fetched are logged and skipped.
    pub async fn build_index<S, H>(
        &self,
        source: &S,
        resolver: &mut CommitResolver<H>,
    ) -> Result<Vec<ImageEntry>>
    where
        S: CommitSource,
        H: PersistHook,
    {
        let mut commits = source.list_recent_commits(self.window).await?;
        if !source.newest_first() {
            commits.sort_by(|a, b| b.authored_at.cmp(&a.authored_at));
        }

        let mut images: IndexMap<String, ImageEntry> = IndexMap::new();
        let mut scanned = 0;

        for commit in &commits {
            if images.len() >= self.max_entries {
                tracing::debug!("Index full after {} commits", scanned);
                break;
            }
            scanned += 1;

            let detail = match resolver.resolve(source, &commit.sha).await {
                Ok(detail) => detail,
                Err(e) => {
                    tracing::warn!("Failed to get commit detail {}: {}", commit.sha, e);
                    continue;
                }
            };

            self.fold_commit(commit, &detail, &mut images);
        }

        let mut entries: Vec<ImageEntry> = images.into_values().collect();
        entries.sort_by(|a, b| b.committed_at.cmp(&a.committed_at));
        entries.truncate(self.max_entries);

        tracing::info!(
            "Indexed {} images from {} of {} commits",
            entries.len(),
            scanned,
            commits.len()
        );
        Ok(entries)
    }

    fn fold_commit(
        &self,
        commit: &CommitRef,
        detail: &CommitDetail,
        images: &mut IndexMap<String, ImageEntry>,
    ) {
        for change in &detail.changes {
            if change.status == FileStatus::Removed || !self.filter.matches(&change.path) {
                continue;
            }

            let replace = images.get(&change.path).is_none_or(|existing| {
                existing.change_sha != change.change_sha
                    && match self.policy {
                        UpsertPolicy::NewerWins => commit.authored_at > existing.committed_at,
                        UpsertPolicy::ChangeIdDiffers => true,
                    }
            });

            if replace {
                images.insert(
                    change.path.clone(),
                    ImageEntry {
                        path: change.path.clone(),
                        change_sha: change.change_sha.clone(),
                        resolved_url: self.links.url_for(&change.path),
                        committed_at: commit.authored_at,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeSource, added, at};
    use crate::error::Error;
    use crate::models::FileChange;
    use crate::resolver::{DetailCache, NoPersist};
    use tokio_test::block_on;

    fn resolver() -> CommitResolver<NoPersist> {
        CommitResolver::new(DetailCache::new(50).unwrap(), NoPersist)
    }

    fn builder(max_entries: usize) -> IndexBuilder {
        IndexBuilder::new(LinkResolver::new("me/pics", "main", None)).max_entries(max_entries)
    }

    fn paths(entries: &[ImageEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_cap_reached_before_oldest_commit() {
        let source = FakeSource::new()
            .commit("c3", 3, vec![added("img/a.png", "a3")])
            .commit("c2", 2, vec![added("img/b.png", "b2")])
            .commit("c1", 1, vec![added("img/a.png", "a1")]);

        let entries = block_on(builder(2).build_index(&source, &mut resolver())).unwrap();

        assert_eq!(paths(&entries), vec!["img/a.png", "img/b.png"]);
        assert_eq!(entries[0].committed_at, at(3));
        assert_eq!(entries[0].change_sha, "a3");
        assert_eq!(entries[1].committed_at, at(2));
        assert_eq!(source.detail_calls(), vec!["c3", "c2"]);
    }

    #[test]
    fn test_failed_detail_is_skipped() {
        let source = FakeSource::new()
            .commit("c3", 3, vec![added("img/a.png", "a3")])
            .commit("c2", 2, vec![added("img/b.png", "b2")])
            .commit("c1", 1, vec![added("img/c.png", "c1")])
            .failing_detail("c2");

        let entries = block_on(builder(10).build_index(&source, &mut resolver())).unwrap();

        assert_eq!(paths(&entries), vec!["img/a.png", "img/c.png"]);
        assert_eq!(source.detail_calls(), vec!["c3", "c2", "c1"]);
    }

    #[test]
    fn test_listing_failure_propagates() {
        let source = FakeSource::new()
            .commit("c1", 1, vec![added("img/a.png", "a1")])
            .failing_list(503);

        let err = block_on(builder(10).build_index(&source, &mut resolver())).unwrap_err();

        assert!(matches!(err, Error::Upstream { status: Some(503), .. }));
        assert!(source.detail_calls().is_empty());
    }

    #[test]
    fn test_rebuild_is_identical_and_cached() {
        let source = FakeSource::new()
            .commit("c3", 3, vec![added("img/a.png", "a3"), added("img/d.gif", "d3")])
            .commit("c2", 2, vec![added("img/b.png", "b2")])
            .commit("c1", 1, vec![added("img/c.jpg", "c1")]);
        let mut resolver = resolver();
        let builder = builder(10);

        let first = block_on(builder.build_index(&source, &mut resolver)).unwrap();
        let second = block_on(builder.build_index(&source, &mut resolver)).unwrap();

        assert_eq!(first, second);
        assert_eq!(source.detail_calls(), vec!["c3", "c2", "c1"]);
    }

    #[test]
    fn test_same_path_keeps_newest_commit() {
        let source = FakeSource::new()
            .commit("c2", 20, vec![added("img/a.png", "new")])
            .commit("c1", 10, vec![added("img/a.png", "old")]);

        let entries = block_on(builder(10).build_index(&source, &mut resolver())).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].committed_at, at(20));
        assert_eq!(entries[0].change_sha, "new");
    }

    #[test]
    fn test_change_id_policy_lets_older_commit_overwrite() {
        let source = FakeSource::new()
            .commit("c2", 20, vec![added("img/a.png", "new")])
            .commit("c1", 10, vec![added("img/a.png", "old")]);
        let builder = builder(10).policy(UpsertPolicy::ChangeIdDiffers);

        let entries = block_on(builder.build_index(&source, &mut resolver())).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].committed_at, at(10));
        assert_eq!(entries[0].change_sha, "old");
    }

    #[test]
    fn test_stops_walking_at_max_entries() {
        let mut source = FakeSource::new();
        for i in (1..=6).rev() {
            source = source.commit(&format!("c{i}"), i, vec![added(&format!("img/{i}.png"), "x")]);
        }

        let entries = block_on(builder(3).build_index(&source, &mut resolver())).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(paths(&entries), vec!["img/6.png", "img/5.png", "img/4.png"]);
        assert_eq!(source.detail_calls().len(), 3);
    }

    #[test]
    fn test_large_commit_is_truncated_in_change_order() {
        let source = FakeSource::new().commit(
            "c1",
            1,
            vec![
                added("img/x.png", "x"),
                added("img/y.png", "y"),
                added("img/z.png", "z"),
            ],
        );

        let entries = block_on(builder(2).build_index(&source, &mut resolver())).unwrap();

        assert_eq!(paths(&entries), vec!["img/x.png", "img/y.png"]);
    }

    #[test]
    fn test_filters_removed_and_non_images() {
        let source = FakeSource::new().commit(
            "c1",
            1,
            vec![
                FileChange::new("img/gone.png", "", FileStatus::Removed),
                added("docs/a.png", "d"),
                added("img/notes.txt", "n"),
                added("img/LOUD.PNG", "l"),
                FileChange::new("img/moved.webp", "m", FileStatus::Renamed),
            ],
        );

        let entries = block_on(builder(10).build_index(&source, &mut resolver())).unwrap();

        assert_eq!(paths(&entries), vec!["img/LOUD.PNG", "img/moved.webp"]);
        assert_eq!(
            entries[0].resolved_url,
            "https://raw.githubusercontent.com/me/pics/main/img/LOUD.PNG"
        );
    }

    #[test]
    fn test_unordered_listing_is_sorted_before_walk() {
        let source = FakeSource::new()
            .commit("c1", 1, vec![added("img/a.png", "a1")])
            .commit("c3", 3, vec![added("img/c.png", "c3")])
            .commit("c2", 2, vec![added("img/b.png", "b2")])
            .unordered();

        let entries = block_on(builder(2).build_index(&source, &mut resolver())).unwrap();

        assert_eq!(paths(&entries), vec!["img/c.png", "img/b.png"]);
        assert_eq!(source.detail_calls(), vec!["c3", "c2"]);
    }

    #[test]
    fn test_window_bounds_listing() {
        let source = FakeSource::new()
            .commit("c2", 2, vec![added("img/b.png", "b2")])
            .commit("c1", 1, vec![added("img/a.png", "a1")]);

        let entries = block_on(builder(10).window(1).build_index(&source, &mut resolver())).unwrap();

        assert_eq!(paths(&entries), vec!["img/b.png"]);
        assert_eq!(*source.list_calls.borrow(), vec![1]);
    }

    #[test]
    fn test_filter_extensions() {
        let filter = ImageFilter::new("img/", [".PNG", " webp ", ""]);
        assert_eq!(filter.extensions(), ["png", "webp"]);
        assert!(filter.matches("img/a.png"));
        assert!(filter.matches("img/2024/a.WebP"));
        assert!(!filter.matches("img/a.jpg"));
        assert!(!filter.matches("img/png"));
        assert!(!filter.matches("assets/img/a.png"));
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("img/a.tar.gz"), Some("gz"));
        assert_eq!(extension("img.d/readme"), None);
        assert_eq!(extension("img/trailing."), None);
    }
}
