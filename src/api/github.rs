//! GitHub REST API client

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::CommitSource;
use crate::error::{Error, Result};
use crate::models::{CommitDetail, CommitRef, FileChange, FileStatus};

/// Default GitHub API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// GitHub rejects requests without a user agent
const USER_AGENT: &str = concat!("gitpix/", env!("CARGO_PKG_VERSION"));

/// Largest page the commits endpoint serves
const MAX_PER_PAGE: usize = 100;

/// GitHub API client bound to one repository
pub struct GitHubClient {
    client: Client,
    api_base: String,
    repository: String,
    token: String,
    branch: Option<String>,
}

impl GitHubClient {
    /// Create a client for `owner/name` on github.com
    pub fn new(repository: &str, token: &str) -> Result<Self> {
        Self::with_api_base(DEFAULT_API_BASE, repository, token)
    }

    /// Create a client against a specific API endpoint (GitHub Enterprise)
    pub fn with_api_base(api_base: &str, repository: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
            token: token.to_string(),
            branch: None,
        })
    }

    /// Commit uploads to `branch` instead of the default branch
    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }

    /// Repository this client talks to
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Build a repository API URL
    fn repo_url(&self, endpoint: &str) -> String {
        format!("{}/repos/{}{}", self.api_base, self.repository, endpoint)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.authorized(self.client.get(url)).send().await?;
        let response = ensure_success(response).await?;

        response.json().await.map_err(|e| Error::Upstream {
            status: None,
            message: format!("Failed to decode {url}: {e}"),
        })
    }

    /// Check whether the configured repository is reachable
    pub async fn repository_exists(&self) -> Result<bool> {
        let response = self
            .authorized(self.client.get(self.repo_url("")))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            _ => ensure_success(response).await.map(|_| true),
        }
    }
}

impl CommitSource for GitHubClient {
    async fn list_recent_commits(&self, count: usize) -> Result<Vec<CommitRef>> {
        let per_page = count.clamp(1, MAX_PER_PAGE);
        let url = self.repo_url(&format!("/commits?per_page={per_page}"));

        let commits: Vec<GitHubCommit> = self.fetch_json(&url).await?;
        tracing::debug!("Listed {} commits from {}", commits.len(), self.repository);

        Ok(commits.into_iter().map(GitHubCommit::into_ref).collect())
    }

    async fn get_commit_detail(&self, sha: &str) -> Result<CommitDetail> {
        let url = self.repo_url(&format!("/commits/{sha}"));
        let detail: GitHubCommitDetail = self.fetch_json(&url).await?;
        Ok(detail.into_detail())
    }

    async fn put_content(&self, path: &str, bytes: &[u8], message: &str) -> Result<()> {
        let url = self.repo_url(&format!("/contents/{}", encode_path(path)));

        let request = PutContentRequest {
            message,
            content: STANDARD.encode(bytes),
            branch: self.branch.as_deref(),
        };

        let response = self
            .authorized(self.client.put(&url))
            .json(&request)
            .send()
            .await?;
        ensure_success(response).await?;

        tracing::info!("Uploaded {} ({} bytes) to {}", path, bytes.len(), self.repository);
        Ok(())
    }
}

/// Turn a non-2xx response into an upstream error
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GitHubErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    Err(Error::upstream(status.as_u16(), message))
}

/// Percent-encode each segment of a repository path
fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// ==================== API Types ====================

#[derive(Debug, Deserialize)]
struct GitHubCommit {
    sha: String,
    commit: GitHubCommitInfo,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitInfo {
    author: Option<GitHubSignature>,
    committer: Option<GitHubSignature>,
}

#[derive(Debug, Deserialize)]
struct GitHubSignature {
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitDetail {
    sha: String,
    #[serde(default)]
    files: Vec<GitHubFile>,
}

#[derive(Debug, Deserialize)]
struct GitHubFile {
    filename: String,
    #[serde(default)]
    sha: Option<String>,
    status: FileStatus,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct PutContentRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

impl GitHubCommit {
    fn into_ref(self) -> CommitRef {
        let authored_at = self
            .commit
            .author
            .or(self.commit.committer)
            .map(|signature| signature.date)
            .unwrap_or_default();

        CommitRef {
            sha: self.sha,
            authored_at,
        }
    }
}

impl GitHubCommitDetail {
    fn into_detail(self) -> CommitDetail {
        CommitDetail {
            sha: self.sha,
            changes: self
                .files
                .into_iter()
                .map(|file| FileChange {
                    path: file.filename,
                    change_sha: file.sha.unwrap_or_default(),
                    status: file.status,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_listing_decodes() {
        let json = r#"[
            {"sha": "c2", "commit": {"author": {"name": "me", "date": "2024-05-02T10:00:00Z"}}},
            {"sha": "c1", "commit": {"author": null, "committer": {"date": "2024-05-01T10:00:00Z"}}}
        ]"#;

        let commits: Vec<GitHubCommit> = serde_json::from_str(json).unwrap();
        let refs: Vec<CommitRef> = commits.into_iter().map(GitHubCommit::into_ref).collect();

        assert_eq!(refs[0].sha, "c2");
        assert_eq!(refs[0].authored_at.to_rfc3339(), "2024-05-02T10:00:00+00:00");
        assert_eq!(refs[1].authored_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_commit_detail_decodes() {
        let json = r#"{
            "sha": "c1",
            "files": [
                {"filename": "img/a.png", "sha": "b1", "status": "added", "additions": 0},
                {"filename": "img/old.png", "sha": null, "status": "removed"},
                {"filename": "README.md", "sha": "b3", "status": "modified"}
            ]
        }"#;

        let detail = serde_json::from_str::<GitHubCommitDetail>(json)
            .unwrap()
            .into_detail();

        assert_eq!(detail.sha, "c1");
        assert_eq!(detail.changes.len(), 3);
        assert_eq!(detail.changes[0], FileChange::new("img/a.png", "b1", FileStatus::Added));
        assert_eq!(detail.changes[1].status, FileStatus::Removed);
        assert_eq!(detail.changes[1].change_sha, "");
    }

    #[test]
    fn test_commit_detail_without_files() {
        let detail = serde_json::from_str::<GitHubCommitDetail>(r#"{"sha": "merge"}"#)
            .unwrap()
            .into_detail();
        assert!(detail.changes.is_empty());
    }

    #[test]
    fn test_repo_url() {
        let client =
            GitHubClient::with_api_base("https://ghe.example.com/api/v3/", "me/pics", "t").unwrap();
        assert_eq!(
            client.repo_url("/commits?per_page=20"),
            "https://ghe.example.com/api/v3/repos/me/pics/commits?per_page=20"
        );
    }

    #[test]
    fn test_new_targets_github_com() {
        let client = GitHubClient::new("me/pics", "t").unwrap().with_branch("pages");
        assert_eq!(client.repository(), "me/pics");
        assert_eq!(client.repo_url(""), "https://api.github.com/repos/me/pics");
        assert_eq!(client.branch.as_deref(), Some("pages"));
        assert!(USER_AGENT.starts_with("gitpix/"));
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("img/2024/my cat.png"), "img/2024/my%20cat.png");
        assert_eq!(encode_path("/img/a.png"), "img/a.png");
    }

    #[test]
    fn test_put_request_body() {
        let request = PutContentRequest {
            message: "Upload image: a.png",
            content: STANDARD.encode(b"png"),
            branch: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["content"], "cG5n");
        assert!(json.get("branch").is_none());
    }
}
