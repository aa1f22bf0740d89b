//! Typed error hierarchy for the copydesk back-end.
//!
//! Two enums cover the two failure domains:
//! - `PublishError` — remote-store and publisher failures
//! - `RenderError` — section renderer failures
//!
//! The HTTP-facing `ApiError` (including `Unauthorized`) lives in
//! `dashboard::api` next to the handlers that produce it.

use thiserror::Error;

/// Errors from the git-backed publisher and the remote file store.
///
/// None of these are retried automatically; every failure surfaces to the
/// immediate caller, which decides whether to restart the whole sequence.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Remote path not found: {path}")]
    NotFound { path: String },

    /// The optimistic-concurrency check failed: a stale content sha on a
    /// single-file write, or the branch ref moved underneath a batch.
    #[error("Concurrent update detected: {0}")]
    Conflict(String),

    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from mapping a section's stored JSON document into HTML edits.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No renderer for section '{0}'")]
    UnknownSection(String),

    #[error("Section data for '{section}' is malformed: {source}")]
    BadData {
        section: String,
        #[source]
        source: serde_json::Error,
    },
}
