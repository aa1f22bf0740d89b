//! Dashboard back-end — content editing and git-backed publishing.
//!
//! ## Overview
//!
//! Staff edit named sections of site copy through the dashboard UI; drafts
//! land in a SQLite `content` table, and publishing splices the stored
//! copy into the live site's HTML and commits it to the site repository,
//! which redeploys via its own CI.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────┐
//! │Dashboard │ ───────> │  server.rs  (axum Router, start_server)      │
//! │   UI     │ <─────── │    └─ api.rs  (route handlers, AppState)     │
//! └──────────┘          │         │                                    │
//!                       │         ├─ db.rs      content drafts (SQLite)│
//!                       │         ├─ render.rs  section → HTML splices │
//!                       │         v                                    │
//!                       │  publisher.rs  (single/multi-file commits)   │
//!                       │         │                                    │
//!                       │         v  RemoteStore trait (remote.rs)     │
//!                       │  github.rs  (contents + Git Data API client) │
//!                       └──────────────────────────────────────────────┘
//! ```
//!
//! ## Typical Request Flow (publish the footer)
//!
//! 1. `POST /api/content/publish {section: "footer"}` → `api::publish_content`
//! 2. The session check runs before any store access; the draft row is
//!    loaded and parsed into a [`render::SectionContent`].
//! 3. Each affected page is fetched fresh from the remote and re-rendered;
//!    the batch lands through `publisher::Publisher::publish_multiple_files`
//!    as exactly one commit (blobs → tree → commit → ref update).
//! 4. Only after the commit is in does the row flip to `published`.

pub mod api;
pub mod db;
pub mod github;
pub mod models;
pub mod publisher;
pub mod remote;
pub mod render;
pub mod server;
