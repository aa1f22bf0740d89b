//! Git-backed publisher: materialize section edits into the live site's
//! repository.
//!
//! Single-file publishes ride the contents API with the file's last-read
//! sha as the concurrency token. Multi-file publishes stitch the Git Data
//! API into one commit: resolve head → resolve base tree → create blobs
//! (concurrently) → overlay tree → commit → move the ref. The ref update
//! is the single point of visibility; a branch that moved in the meantime
//! surfaces as `Conflict` and the caller restarts the whole sequence.
//! Objects created by an abandoned sequence stay unreferenced on the
//! remote and need no cleanup.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::try_join_all;
use tracing::debug;

use super::remote::{BatchFile, RemoteStore, TreeEntry};
use crate::errors::PublishError;

pub struct Publisher {
    remote: Arc<dyn RemoteStore>,
}

impl Publisher {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// Rewrite one file in its own commit.
    ///
    /// Fetches the current content and token, applies `transform`, and
    /// writes back. Returns `None` without committing when the transform
    /// leaves the content unchanged, so re-publishing an unedited section
    /// does not produce empty commits.
    pub async fn publish_single_file<F>(
        &self,
        path: &str,
        transform: F,
        message: &str,
    ) -> Result<Option<String>, PublishError>
    where
        F: FnOnce(&str) -> String,
    {
        let current = self.remote.get_file(path).await?;
        let next = transform(&current.content);
        if next == current.content {
            debug!(path, "content unchanged, skipping commit");
            return Ok(None);
        }
        let commit = self
            .remote
            .put_file(path, next.as_bytes(), Some(&current.sha), message)
            .await?;
        Ok(Some(commit))
    }

    /// Land a batch of fully-rendered files in exactly one commit.
    ///
    /// Until the final ref update no reader of the branch observes any
    /// change; if another commit lands between resolving the head and
    /// moving the ref, the update fails with `Conflict` and nothing from
    /// this batch becomes visible. The caller may restart the sequence
    /// from scratch; there is no partial-batch fallback.
    pub async fn publish_multiple_files(
        &self,
        batch: &[BatchFile],
        message: &str,
    ) -> Result<String, PublishError> {
        let head = self.remote.get_branch_head().await?;
        let base_tree = self.remote.get_commit_tree(&head).await?;

        // Blob creations are independent of each other; only the tree
        // needs all of them.
        let entries = try_join_all(batch.iter().map(|file| async {
            let blob_sha = self.remote.create_blob(file.content.as_bytes()).await?;
            Ok::<_, PublishError>(TreeEntry {
                path: file.path.clone(),
                blob_sha,
            })
        }))
        .await?;

        let tree = self.remote.create_tree(&base_tree, &entries).await?;
        let commit = self.remote.create_commit(&tree, &head, message).await?;
        self.remote.update_branch_ref(&head, &commit).await?;
        debug!(commit = %commit, files = batch.len(), "batch committed");
        Ok(commit)
    }

    /// Commit raw bytes under a fresh, collision-free path and return it.
    ///
    /// The stored name is `images/<stamp>-<sanitized original>`; the stamp
    /// is strictly monotonic so rapid uploads of the same logical name
    /// never collide.
    pub async fn publish_binary_asset(
        &self,
        logical_name: &str,
        bytes: &[u8],
        message: &str,
    ) -> Result<String, PublishError> {
        let path = format!(
            "images/{}-{}",
            next_upload_stamp(),
            sanitize_file_name(logical_name)
        );

        // The stamp makes an existing file at this path unexpected, but a
        // prior token is looked up anyway so an overwrite would still go
        // through the concurrency check.
        let existing = match self.remote.get_file(&path).await {
            Ok(file) => Some(file.sha),
            Err(PublishError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        self.remote
            .put_file(&path, bytes, existing.as_deref(), message)
            .await?;
        Ok(path)
    }
}

/// Replace everything outside a conservative allow-list so the result is
/// safe as a repository path segment.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Nanosecond wall-clock stamp, bumped past the previous value when two
/// calls land in the same instant.
fn next_upload_stamp() -> u64 {
    static LAST: AtomicU64 = AtomicU64::new(0);
    let now = chrono::Utc::now()
        .timestamp_nanos_opt()
        .map(|n| n as u64)
        .unwrap_or(0);
    let mut prev = LAST.load(Ordering::Relaxed);
    loop {
        let stamp = now.max(prev + 1);
        match LAST.compare_exchange(prev, stamp, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return stamp,
            Err(actual) => prev = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::remote::mock::InMemoryRemote;

    fn publisher_with(remote: &Arc<InMemoryRemote>) -> Publisher {
        Publisher::new(Arc::clone(remote) as Arc<dyn RemoteStore>)
    }

    // ── publish_single_file ──────────────────────────────────────────

    #[tokio::test]
    async fn single_file_commits_transformed_content() {
        let remote = Arc::new(InMemoryRemote::new());
        remote.seed_file("index.html", "<h1>old</h1>");
        let publisher = publisher_with(&remote);

        let commit = publisher
            .publish_single_file("index.html", |html| html.replace("old", "new"), "update")
            .await
            .unwrap();

        assert!(commit.is_some());
        assert_eq!(remote.file_at_head("index.html").unwrap(), "<h1>new</h1>");
    }

    #[tokio::test]
    async fn single_file_skips_commit_when_unchanged() {
        let remote = Arc::new(InMemoryRemote::new());
        remote.seed_file("index.html", "<h1>same</h1>");
        let publisher = publisher_with(&remote);
        let commits_before = remote.commit_count();

        let commit = publisher
            .publish_single_file("index.html", |html| html.to_string(), "no-op")
            .await
            .unwrap();

        assert!(commit.is_none());
        assert_eq!(remote.commit_count(), commits_before);
    }

    #[tokio::test]
    async fn single_file_missing_path_is_not_found() {
        let remote = Arc::new(InMemoryRemote::new());
        let publisher = publisher_with(&remote);

        let err = publisher
            .publish_single_file("ghost.html", |html| html.to_string(), "update")
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::NotFound { .. }));
    }

    #[tokio::test]
    async fn single_file_racing_writer_yields_conflict() {
        let remote = Arc::new(InMemoryRemote::new());
        remote.seed_file("index.html", "v1");
        // A concurrent commit lands between our read and our write,
        // staling the sha we fetched.
        remote.race_commit_after_get("index.html", "raced");
        let publisher = publisher_with(&remote);

        let err = publisher
            .publish_single_file("index.html", |_| "v2".to_string(), "update")
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Conflict(_)));
        // The racing writer's content survives.
        assert_eq!(remote.file_at_head("index.html").unwrap(), "raced");
    }

    // ── publish_multiple_files ───────────────────────────────────────

    fn footer_batch() -> Vec<BatchFile> {
        ["index.html", "about.html", "coaching.html", "contact.html", "system.html"]
            .iter()
            .map(|path| BatchFile {
                path: path.to_string(),
                content: format!("<footer>new</footer> on {}", path),
            })
            .collect()
    }

    #[tokio::test]
    async fn batch_lands_all_files_in_exactly_one_commit() {
        let remote = Arc::new(InMemoryRemote::new());
        for file in footer_batch() {
            remote.seed_file(&file.path, "<footer>old</footer>");
        }
        remote.seed_file("untouched.html", "leave me");
        let publisher = publisher_with(&remote);

        let base_head = remote.head();
        let batch = footer_batch();
        let commit = publisher
            .publish_multiple_files(&batch, "Update footer")
            .await
            .unwrap();

        assert_eq!(remote.head(), commit);

        // The new tree differs from the base in exactly the batch paths.
        let before = remote.snapshot_of(&base_head);
        let after = remote.snapshot_of(&commit);
        let changed: Vec<&String> = after
            .iter()
            .filter(|(path, blob)| before.get(*path) != Some(*blob))
            .map(|(path, _)| path)
            .collect();
        let mut expected: Vec<&String> = batch.iter().map(|f| &f.path).collect();
        expected.sort();
        assert_eq!(changed, expected);
        assert_eq!(remote.file_at_head("untouched.html").unwrap(), "leave me");
    }

    #[tokio::test]
    async fn batch_conflict_leaves_racing_commit_intact() {
        let remote = Arc::new(InMemoryRemote::new());
        remote.seed_file("index.html", "old");
        remote.seed_file("about.html", "old");
        // Concurrent writer lands right after we resolve the head.
        remote.race_commit_after_head("index.html", "winner");
        let publisher = publisher_with(&remote);

        let batch = vec![
            BatchFile {
                path: "index.html".to_string(),
                content: "loser".to_string(),
            },
            BatchFile {
                path: "about.html".to_string(),
                content: "loser".to_string(),
            },
        ];
        let err = publisher
            .publish_multiple_files(&batch, "Update")
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Conflict(_)));
        // All-or-nothing: neither batch file is visible, the winner is.
        assert_eq!(remote.file_at_head("index.html").unwrap(), "winner");
        assert_eq!(remote.file_at_head("about.html").unwrap(), "old");
    }

    #[tokio::test]
    async fn batch_retry_after_conflict_succeeds() {
        let remote = Arc::new(InMemoryRemote::new());
        remote.seed_file("index.html", "old");
        remote.race_commit_after_head("index.html", "raced");
        let publisher = publisher_with(&remote);

        let batch = vec![BatchFile {
            path: "index.html".to_string(),
            content: "mine".to_string(),
        }];
        assert!(publisher.publish_multiple_files(&batch, "try 1").await.is_err());

        // Restart the whole sequence: fresh head, fresh blobs.
        let commit = publisher
            .publish_multiple_files(&batch, "try 2")
            .await
            .unwrap();
        assert_eq!(remote.head(), commit);
        assert_eq!(remote.file_at_head("index.html").unwrap(), "mine");
    }

    // ── publish_binary_asset ─────────────────────────────────────────

    #[tokio::test]
    async fn binary_asset_stored_under_images_with_sanitized_name() {
        let remote = Arc::new(InMemoryRemote::new());
        let publisher = publisher_with(&remote);

        let path = publisher
            .publish_binary_asset("team photo (1).png", b"\x89PNG", "Upload image")
            .await
            .unwrap();

        assert!(path.starts_with("images/"));
        assert!(path.ends_with("-team_photo__1_.png"), "got {}", path);
        assert!(remote.file_at_head(&path).is_some());
    }

    #[tokio::test]
    async fn binary_asset_rapid_double_upload_gets_distinct_paths() {
        let remote = Arc::new(InMemoryRemote::new());
        let publisher = publisher_with(&remote);

        let first = publisher
            .publish_binary_asset("logo.png", b"one", "Upload image")
            .await
            .unwrap();
        let second = publisher
            .publish_binary_asset("logo.png", b"two", "Upload image")
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(remote.file_at_head(&first).unwrap(), "one");
        assert_eq!(remote.file_at_head(&second).unwrap(), "two");
    }

    // ── helpers ──────────────────────────────────────────────────────

    #[test]
    fn sanitize_keeps_allow_list_only() {
        assert_eq!(sanitize_file_name("photo-1.final.png"), "photo-1.final.png");
        assert_eq!(sanitize_file_name("a b/c\\d.png"), "a_b_c_d.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
    }

    #[test]
    fn upload_stamps_are_strictly_increasing() {
        let a = next_upload_stamp();
        let b = next_upload_stamp();
        let c = next_upload_stamp();
        assert!(a < b && b < c);
    }
}
