//! Remote version-controlled file store contract.
//!
//! The publisher is written against this trait; production uses the
//! GitHub implementation in [`super::github`], tests use the in-memory
//! store below.

use async_trait::async_trait;

use crate::errors::PublishError;

/// A file as it exists at the head of the target branch.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub content: String,
    /// Content-addressed id of the committed blob. Doubles as the
    /// optimistic-concurrency token for the next write: it is only valid
    /// until the next commit on the branch, so callers re-fetch it
    /// immediately before each write instead of caching it.
    pub sha: String,
}

/// One file of a multi-file publish, fully rendered.
#[derive(Debug, Clone)]
pub struct BatchFile {
    pub path: String,
    pub content: String,
}

/// A `(path, blob)` pair recorded after blob creation, ready to overlay
/// onto a base tree.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub path: String,
    pub blob_sha: String,
}

/// Operations the publisher needs from the remote store.
///
/// The write path mirrors git's object model: blobs and trees and commits
/// are invisible to branch readers until `update_branch_ref` moves the
/// ref, which the store must reject as non-fast-forward (`Conflict`) when
/// the branch no longer points at `from_sha`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch a file's content and concurrency token at the branch head.
    async fn get_file(&self, path: &str) -> Result<RemoteFile, PublishError>;

    /// Create or update one file in its own commit. `sha` must be the
    /// token from the last read when the file exists, `None` when it is
    /// being created. Returns the new commit id.
    async fn put_file(
        &self,
        path: &str,
        content: &[u8],
        sha: Option<&str>,
        message: &str,
    ) -> Result<String, PublishError>;

    async fn get_branch_head(&self) -> Result<String, PublishError>;

    /// Resolve a commit to its root tree id.
    async fn get_commit_tree(&self, commit_sha: &str) -> Result<String, PublishError>;

    async fn create_blob(&self, content: &[u8]) -> Result<String, PublishError>;

    /// Create a tree from `base_tree` with exactly `entries` overlaid;
    /// unlisted paths keep their ids from the base tree.
    async fn create_tree(
        &self,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> Result<String, PublishError>;

    async fn create_commit(
        &self,
        tree_sha: &str,
        parent_sha: &str,
        message: &str,
    ) -> Result<String, PublishError>;

    /// Move the branch ref from `from_sha` to `to_sha`. Fails with
    /// `Conflict` when the branch has moved past `from_sha`.
    async fn update_branch_ref(&self, from_sha: &str, to_sha: &str) -> Result<(), PublishError>;
}
