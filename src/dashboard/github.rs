//! GitHub-backed implementation of [`RemoteStore`].
//!
//! Single-file writes go through the contents API; multi-file batches use
//! the low-level Git Data API (blobs → trees → commits → refs). Status
//! mapping: 404 → `NotFound`, 409/422 → `Conflict` (stale content sha or
//! non-fast-forward ref update), anything else → `RemoteUnavailable`.

use std::sync::OnceLock;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use super::remote::{RemoteFile, RemoteStore, TreeEntry};
use crate::config::GitHubConfig;
use crate::errors::PublishError;

const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "copydesk-admin";

pub const TREE_BLOB_MODE: &str = "100644";
pub const TREE_BLOB_TYPE: &str = "blob";

/// Process-wide HTTP client, constructed on first use.
fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

// ── Wire types ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    commit: ObjectSha,
}

#[derive(Debug, Deserialize)]
struct ObjectSha {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: ObjectSha,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    tree: ObjectSha,
}

#[derive(Debug, Serialize)]
struct CreateBlobRequest {
    content: String,
    encoding: &'static str,
}

#[derive(Debug, Serialize)]
struct CreateTreeRequest<'a> {
    base_tree: &'a str,
    tree: Vec<CreateTreeEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct CreateTreeEntry<'a> {
    path: &'a str,
    mode: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    sha: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateCommitRequest<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateRefRequest<'a> {
    sha: &'a str,
    force: bool,
}

/// The contents API returns base64 with embedded newlines.
fn decode_content(encoded: &str) -> Result<String, PublishError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| PublishError::RemoteUnavailable(format!("Invalid base64 content: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| PublishError::RemoteUnavailable(format!("Non-UTF-8 file content: {}", e)))
}

// ── Client ────────────────────────────────────────────────────────────

pub struct GitHubRemote {
    config: GitHubConfig,
}

impl GitHubRemote {
    pub fn new(config: GitHubConfig) -> Self {
        Self { config }
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            GITHUB_API_URL, self.config.owner, self.config.repo, tail
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        http_client()
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
    }

    /// Send, mapping transport failures and error statuses into the
    /// publish taxonomy, and deserialize the success body.
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, PublishError> {
        let resp = req
            .send()
            .await
            .map_err(|e| PublishError::RemoteUnavailable(format!("{}: {}", context, e)))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PublishError::NotFound {
                path: context.to_string(),
            });
        }
        if status == reqwest::StatusCode::CONFLICT
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            return Err(PublishError::Conflict(format!(
                "{}: GitHub rejected the write ({})",
                context, status
            )));
        }
        if !status.is_success() {
            return Err(PublishError::RemoteUnavailable(format!(
                "{}: GitHub returned {}",
                context, status
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| PublishError::RemoteUnavailable(format!("{}: bad response: {}", context, e)))
    }
}

#[async_trait]
impl RemoteStore for GitHubRemote {
    async fn get_file(&self, path: &str) -> Result<RemoteFile, PublishError> {
        let url = self.repo_url(&format!("contents/{}", path));
        let req = self
            .request(reqwest::Method::GET, &url)
            .query(&[("ref", self.config.branch.as_str())]);
        let resp: ContentsResponse = self.send(req, path).await?;
        Ok(RemoteFile {
            content: decode_content(&resp.content)?,
            sha: resp.sha,
        })
    }

    async fn put_file(
        &self,
        path: &str,
        content: &[u8],
        sha: Option<&str>,
        message: &str,
    ) -> Result<String, PublishError> {
        let url = self.repo_url(&format!("contents/{}", path));
        let body = PutContentsRequest {
            message,
            content: BASE64.encode(content),
            sha,
            branch: &self.config.branch,
        };
        let req = self.request(reqwest::Method::PUT, &url).json(&body);
        let resp: PutContentsResponse = self.send(req, path).await?;
        Ok(resp.commit.sha)
    }

    async fn get_branch_head(&self) -> Result<String, PublishError> {
        let url = self.repo_url(&format!("git/ref/heads/{}", self.config.branch));
        let req = self.request(reqwest::Method::GET, &url);
        let resp: RefResponse = self.send(req, "branch head").await?;
        Ok(resp.object.sha)
    }

    async fn get_commit_tree(&self, commit_sha: &str) -> Result<String, PublishError> {
        let url = self.repo_url(&format!("git/commits/{}", commit_sha));
        let req = self.request(reqwest::Method::GET, &url);
        let resp: CommitResponse = self.send(req, "commit tree").await?;
        Ok(resp.tree.sha)
    }

    async fn create_blob(&self, content: &[u8]) -> Result<String, PublishError> {
        let url = self.repo_url("git/blobs");
        let body = CreateBlobRequest {
            content: BASE64.encode(content),
            encoding: "base64",
        };
        let req = self.request(reqwest::Method::POST, &url).json(&body);
        let resp: ObjectSha = self.send(req, "blob create").await?;
        Ok(resp.sha)
    }

    async fn create_tree(
        &self,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> Result<String, PublishError> {
        let url = self.repo_url("git/trees");
        let body = CreateTreeRequest {
            base_tree,
            tree: entries
                .iter()
                .map(|e| CreateTreeEntry {
                    path: &e.path,
                    mode: TREE_BLOB_MODE,
                    kind: TREE_BLOB_TYPE,
                    sha: &e.blob_sha,
                })
                .collect(),
        };
        let req = self.request(reqwest::Method::POST, &url).json(&body);
        let resp: ObjectSha = self.send(req, "tree create").await?;
        Ok(resp.sha)
    }

    async fn create_commit(
        &self,
        tree_sha: &str,
        parent_sha: &str,
        message: &str,
    ) -> Result<String, PublishError> {
        let url = self.repo_url("git/commits");
        let body = CreateCommitRequest {
            message,
            tree: tree_sha,
            parents: vec![parent_sha],
        };
        let req = self.request(reqwest::Method::POST, &url).json(&body);
        let resp: ObjectSha = self.send(req, "commit create").await?;
        Ok(resp.sha)
    }

    async fn update_branch_ref(&self, _from_sha: &str, to_sha: &str) -> Result<(), PublishError> {
        // GitHub performs its own fast-forward check; `force: false` makes
        // a moved branch come back as 422 rather than a silent overwrite.
        let url = self.repo_url(&format!("git/refs/heads/{}", self.config.branch));
        let body = UpdateRefRequest {
            sha: to_sha,
            force: false,
        };
        let req = self.request(reqwest::Method::PATCH, &url).json(&body);
        let _: RefResponse = self.send(req, "ref update").await?;
        Ok(())
    }
}
