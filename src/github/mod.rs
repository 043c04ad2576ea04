//! GitHub REST / Git Data API client.
//!
//! Drives the blob -> tree -> commit -> ref-update sequence that advances a
//! branch by one commit, plus the read-only lookups the sync flow needs
//! (branches, pull requests, committed file content).

pub mod api;

use crate::error::{CommitStep, GitHubError};
use api::{ApiMessage, Blob, Branch, Commit, FileContents, GitRef, PullRequest, Tree};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// How `update_ref` advances the branch pointer.
///
/// `Force` silently overwrites commits that landed on the branch between the
/// initial ref read and the final update; `FastForwardOnly` lets GitHub
/// reject such a race, surfaced as [`GitHubError::Conflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefUpdatePolicy {
    #[default]
    Force,
    FastForwardOnly,
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub organization: String,
    pub repository: String,
    pub api_url: String,
}

impl GitHubConfig {
    pub fn new(token: &str, organization: &str, repository: &str) -> Self {
        Self {
            token: token.to_string(),
            organization: organization.to_string(),
            repository: repository.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }
}

/// A pending commit: one file's content advancing one branch by one commit.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub branch: String,
    pub message: String,
    pub path: String,
    pub content: String,
    pub policy: RefUpdatePolicy,
}

#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub sha: String,
    pub url: String,
}

pub struct GitHubClient {
    config: GitHubConfig,
    client: Client,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("tokensync"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", config.token)) {
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    fn repo_url(&self, endpoint: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.config.api_url, self.config.organization, self.config.repository, endpoint
        )
    }

    fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T, GitHubError> {
        let url = self.repo_url(endpoint);
        tracing::debug!(%method, %url, "GitHub API request");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .map_err(|err| GitHubError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ApiMessage>(&body)
                .map(|m| m.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(body);
            return Err(map_status(status.as_u16(), message));
        }

        response
            .json::<T>()
            .map_err(|err| GitHubError::Parse(err.to_string()))
    }

    /// Current tip of a branch; 404 maps to [`GitHubError::BranchNotFound`].
    pub fn get_branch_ref(&self, branch: &str) -> Result<GitRef, GitHubError> {
        self.request(Method::GET, &format!("/git/refs/heads/{branch}"), None)
            .map_err(|err| match err {
                GitHubError::NotFound { .. } => GitHubError::BranchNotFound {
                    branch: branch.to_string(),
                },
                other => other,
            })
    }

    pub fn create_blob(&self, content: &str) -> Result<Blob, GitHubError> {
        self.request(
            Method::POST,
            "/git/blobs",
            Some(json!({ "content": content, "encoding": "utf-8" })),
        )
    }

    /// One changed path entry on top of the base tree; everything else is
    /// inherited.
    pub fn create_tree(
        &self,
        base_tree: &str,
        path: &str,
        blob_sha: &str,
    ) -> Result<Tree, GitHubError> {
        self.request(
            Method::POST,
            "/git/trees",
            Some(json!({
                "base_tree": base_tree,
                "tree": [{
                    "path": path,
                    "mode": "100644",
                    "type": "blob",
                    "sha": blob_sha,
                }],
            })),
        )
    }

    pub fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
    ) -> Result<Commit, GitHubError> {
        self.request(
            Method::POST,
            "/git/commits",
            Some(json!({
                "message": message,
                "tree": tree_sha,
                "parents": [parent_sha],
            })),
        )
    }

    pub fn update_ref(
        &self,
        branch: &str,
        sha: &str,
        policy: RefUpdatePolicy,
    ) -> Result<GitRef, GitHubError> {
        let force = policy == RefUpdatePolicy::Force;
        self.request(
            Method::PATCH,
            &format!("/git/refs/heads/{branch}"),
            Some(json!({ "sha": sha, "force": force })),
        )
        .map_err(|err| match err {
            // A rejected non-fast-forward update comes back as 422.
            GitHubError::Validation { message } if !force => GitHubError::Conflict { message },
            other => other,
        })
    }

    /// The five sequential Git Data API calls of a commit. Each call depends
    /// on the previous step's SHA, so nothing here can run concurrently. Any
    /// failure aborts the whole commit, tagged with the step it came from.
    pub fn commit_changes(&self, request: &CommitRequest) -> Result<CommitOutcome, GitHubError> {
        tracing::debug!(branch = %request.branch, path = %request.path, "starting commit pipeline");

        let branch_ref = self
            .get_branch_ref(&request.branch)
            .map_err(|err| err.at_step(CommitStep::GetBranchRef))?;
        let parent_sha = branch_ref.object.sha;

        let blob = self
            .create_blob(&request.content)
            .map_err(|err| err.at_step(CommitStep::CreateBlob))?;

        let tree = self
            .create_tree(&parent_sha, &request.path, &blob.sha)
            .map_err(|err| err.at_step(CommitStep::CreateTree))?;

        let commit = self
            .create_commit(&request.message, &tree.sha, &parent_sha)
            .map_err(|err| err.at_step(CommitStep::CreateCommit))?;

        self.update_ref(&request.branch, &commit.sha, request.policy)
            .map_err(|err| err.at_step(CommitStep::UpdateRef))?;

        tracing::debug!(sha = %commit.sha, "commit pipeline completed");
        Ok(CommitOutcome {
            sha: commit.sha,
            url: commit.html_url,
        })
    }

    /// First open pull request for the head/base pair, if any.
    ///
    /// Advisory and read-only: lookup failures degrade to `None` so a broken
    /// PR query never blocks the commit flow. The result is a hint; the
    /// create-PR call is the authoritative de-duplication point.
    pub fn find_pull_request(&self, head: &str, base: &str) -> Result<Option<PullRequest>, GitHubError> {
        let endpoint = format!(
            "/pulls?head={}:{}&base={}&state=open",
            self.config.organization, head, base
        );
        match self.request::<Vec<PullRequest>>(Method::GET, &endpoint, None) {
            Ok(pulls) => Ok(pulls.into_iter().next()),
            Err(err) => {
                tracing::warn!(%err, "pull request lookup failed, treating as none found");
                Ok(None)
            }
        }
    }

    /// Open a pull request. Errors (including GitHub's own "a pull request
    /// already exists" 422) are surfaced verbatim.
    pub fn create_pull_request(
        &self,
        title: &str,
        head: &str,
        base: &str,
        body: &str,
    ) -> Result<PullRequest, GitHubError> {
        self.request(
            Method::POST,
            "/pulls",
            Some(json!({
                "title": title,
                "head": head,
                "base": base,
                "body": body,
            })),
        )
    }

    pub fn list_branches(&self) -> Result<Vec<Branch>, GitHubError> {
        self.request(Method::GET, "/branches", None)
    }

    /// Fetch a committed file's content from a branch. `Ok(None)` means the
    /// file does not exist there yet.
    pub fn fetch_file(&self, path: &str, branch: &str) -> Result<Option<String>, GitHubError> {
        let endpoint = format!("/contents/{path}?ref={branch}");
        let contents = match self.request::<FileContents>(Method::GET, &endpoint, None) {
            Ok(contents) => contents,
            Err(GitHubError::NotFound { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };

        // The contents API base64-encodes with embedded newlines.
        let cleaned: String = contents
            .content
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = BASE64_STANDARD
            .decode(cleaned)
            .map_err(|err| GitHubError::Parse(format!("base64 decode: {err}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|err| GitHubError::Parse(format!("utf-8 decode: {err}")))?;
        Ok(Some(text))
    }
}

fn map_status(status: u16, message: String) -> GitHubError {
    match status {
        401 | 403 => GitHubError::Auth { status, message },
        404 => GitHubError::NotFound { message },
        422 => GitHubError::Validation { message },
        _ => GitHubError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            map_status(401, "bad credentials".into()),
            GitHubError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            map_status(403, "rate limited".into()),
            GitHubError::Auth { status: 403, .. }
        ));
        assert!(matches!(
            map_status(404, "missing".into()),
            GitHubError::NotFound { .. }
        ));
        assert!(matches!(
            map_status(422, "invalid tree".into()),
            GitHubError::Validation { .. }
        ));
        assert!(matches!(
            map_status(500, "boom".into()),
            GitHubError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn config_trims_trailing_slash() {
        let config = GitHubConfig::new("t", "acme", "tokens").with_api_url("http://localhost:1234/");
        assert_eq!(config.api_url, "http://localhost:1234");
    }

    #[test]
    fn repo_url_shape() {
        let client = GitHubClient::new(GitHubConfig::new("t", "acme", "tokens"));
        assert_eq!(
            client.repo_url("/git/blobs"),
            "https://api.github.com/repos/acme/tokens/git/blobs"
        );
    }
}
