//! Remote repository access

pub mod github;

#[cfg(test)]
pub(crate) mod fake;

use crate::error::Result;
use crate::models::{CommitDetail, CommitRef};

/// Commit-level access to a remote repository
#[allow(async_fn_in_trait)]
pub trait CommitSource {
    /// Get the most recent commits, at most `count`
    async fn list_recent_commits(&self, count: usize) -> Result<Vec<CommitRef>>;

    /// Get the files touched by a commit
    async fn get_commit_detail(&self, sha: &str) -> Result<CommitDetail>;

    /// Create or replace a file with a new commit
    async fn put_content(&self, path: &str, bytes: &[u8], message: &str) -> Result<()>;

    /// Whether `list_recent_commits` returns commits newest first
    fn newest_first(&self) -> bool {
        true
    }
}
