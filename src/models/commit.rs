//! Commit models (as decoded from the remote repository)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit in the recent history listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    /// Commit identifier
    pub sha: String,
    /// When the commit was authored
    pub authored_at: DateTime<Utc>,
}

impl CommitRef {
    /// Create a commit reference
    pub fn new(sha: &str, authored_at: DateTime<Utc>) -> Self {
        Self {
            sha: sha.to_string(),
            authored_at,
        }
    }
}

/// Status of a file within a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// File was created
    Added,
    /// File content changed
    #[default]
    Modified,
    /// File was deleted
    Removed,
    /// File was moved
    Renamed,
    /// File was copied from another path
    Copied,
    /// File mode or type changed
    Changed,
    /// Listed without changes
    Unchanged,
    /// Status not known to gitpix
    #[serde(other)]
    Unknown,
}

impl FileStatus {
    /// Get the status as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
            Self::Renamed => "renamed",
            Self::Copied => "copied",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file touched by a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Repository-relative path after the change
    pub path: String,
    /// Blob identifier of the resulting content
    pub change_sha: String,
    /// What happened to the file
    pub status: FileStatus,
}

impl FileChange {
    /// Create a file change
    pub fn new(path: &str, change_sha: &str, status: FileStatus) -> Self {
        Self {
            path: path.to_string(),
            change_sha: change_sha.to_string(),
            status,
        }
    }
}

/// Full detail of a commit (the expensive lookup the cache memoizes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    /// Commit identifier
    pub sha: String,
    /// Files touched, in upstream order
    #[serde(default)]
    pub changes: Vec<FileChange>,
}

impl CommitDetail {
    /// Create a commit detail record
    pub fn new(sha: &str, changes: Vec<FileChange>) -> Self {
        Self {
            sha: sha.to_string(),
            changes,
        }
    }
}
