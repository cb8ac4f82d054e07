//! In-memory commit source for tests

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeZone, Utc};

use super::CommitSource;
use crate::error::{Error, Result};
use crate::models::{CommitDetail, CommitRef, FileChange, FileStatus};

/// Scripted repository history
#[derive(Default)]
pub struct FakeSource {
    commits: Vec<CommitRef>,
    details: HashMap<String, CommitDetail>,
    failing: HashSet<String>,
    list_failure: Option<u16>,
    unordered: bool,
    pub detail_calls: RefCell<Vec<String>>,
    pub list_calls: RefCell<Vec<usize>>,
    pub uploads: RefCell<Vec<(String, Vec<u8>, String)>>,
}

/// Timestamp `secs` seconds after the epoch
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// An `added` change
pub fn added(path: &str, blob: &str) -> FileChange {
    FileChange::new(path, blob, FileStatus::Added)
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit (call in the order the listing should return them)
    pub fn commit(mut self, sha: &str, secs: i64, changes: Vec<FileChange>) -> Self {
        self.commits.push(CommitRef::new(sha, at(secs)));
        self.details
            .insert(sha.to_string(), CommitDetail::new(sha, changes));
        self
    }

    pub fn failing_detail(mut self, sha: &str) -> Self {
        self.failing.insert(sha.to_string());
        self
    }

    pub fn failing_list(mut self, status: u16) -> Self {
        self.list_failure = Some(status);
        self
    }

    pub fn unordered(mut self) -> Self {
        self.unordered = true;
        self
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.borrow().clone()
    }
}

impl CommitSource for FakeSource {
    async fn list_recent_commits(&self, count: usize) -> Result<Vec<CommitRef>> {
        self.list_calls.borrow_mut().push(count);
        if let Some(status) = self.list_failure {
            return Err(Error::upstream(status, "listing failed"));
        }
        Ok(self.commits.iter().take(count).cloned().collect())
    }

    async fn get_commit_detail(&self, sha: &str) -> Result<CommitDetail> {
        self.detail_calls.borrow_mut().push(sha.to_string());
        if self.failing.contains(sha) {
            return Err(Error::upstream(500, "Internal Server Error"));
        }
        self.details
            .get(sha)
            .cloned()
            .ok_or_else(|| Error::upstream(404, "Not Found"))
    }

    async fn put_content(&self, path: &str, bytes: &[u8], message: &str) -> Result<()> {
        self.uploads
            .borrow_mut()
            .push((path.to_string(), bytes.to_vec(), message.to_string()));
        Ok(())
    }

    fn newest_first(&self) -> bool {
        !self.unordered
    }
}
