use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use super::models::{ContentRow, ContentRowRaw};

/// Async-safe handle to the content database.
///
/// Wraps `ContentDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, preventing synchronous SQLite
/// I/O from tying up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<ContentDb>>,
}

impl DbHandle {
    pub fn new(db: ContentDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&ContentDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

pub struct ContentDb {
    conn: Connection,
}

impl ContentDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS content (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    section TEXT NOT NULL UNIQUE,
                    data TEXT NOT NULL,
                    published INTEGER NOT NULL DEFAULT 0,
                    published_at TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── Content CRUD ──────────────────────────────────────────────────

    pub fn get_section(&self, section: &str) -> Result<Option<ContentRow>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, section, data, published, published_at, created_at, updated_at
                 FROM content WHERE section = ?1",
            )
            .context("Failed to prepare get_section")?;
        let raw = stmt
            .query_row(params![section], Self::map_raw)
            .optional()
            .context("Failed to query section")?;
        match raw {
            Some(raw) => Ok(Some(raw.into_row()?)),
            None => Ok(None),
        }
    }

    pub fn list_sections(&self) -> Result<Vec<ContentRow>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, section, data, published, published_at, created_at, updated_at
                 FROM content ORDER BY section",
            )
            .context("Failed to prepare list_sections")?;
        let rows = stmt
            .query_map([], Self::map_raw)
            .context("Failed to query content")?;
        let mut sections = Vec::new();
        for row in rows {
            let raw = row.context("Failed to read content row")?;
            sections.push(raw.into_row()?);
        }
        Ok(sections)
    }

    /// Create or update a section in one step.
    ///
    /// When `published` is `None`, an update preserves the row's current
    /// value and a fresh insert starts at `false`.
    pub fn upsert_section(
        &self,
        section: &str,
        data: &serde_json::Value,
        published: Option<bool>,
    ) -> Result<ContentRow> {
        let data_text = serde_json::to_string(data).context("Failed to serialize section data")?;
        let existing = self.get_section(section)?;
        match existing {
            Some(row) => {
                let published = published.unwrap_or(row.published);
                self.conn
                    .execute(
                        "UPDATE content
                         SET data = ?1, published = ?2, updated_at = datetime('now')
                         WHERE section = ?3",
                        params![data_text, published, section],
                    )
                    .context("Failed to update content row")?;
            }
            None => {
                let published = published.unwrap_or(false);
                self.conn
                    .execute(
                        "INSERT INTO content (section, data, published) VALUES (?1, ?2, ?3)",
                        params![section, data_text, published],
                    )
                    .context("Failed to insert content row")?;
            }
        }
        self.get_section(section)?
            .context("Content row not found after upsert")
    }

    /// Flip a section to published and stamp `published_at`.
    ///
    /// Called only after the remote commit has succeeded; a publish that
    /// fails remotely must leave the row untouched.
    pub fn mark_published(&self, section: &str) -> Result<Option<ContentRow>> {
        let changed = self
            .conn
            .execute(
                "UPDATE content
                 SET published = 1, published_at = datetime('now'), updated_at = datetime('now')
                 WHERE section = ?1",
                params![section],
            )
            .context("Failed to mark section published")?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_section(section)
    }

    fn map_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContentRowRaw> {
        Ok(ContentRowRaw {
            id: row.get(0)?,
            section: row.get(1)?,
            data: row.get(2)?,
            published: row.get(3)?,
            published_at: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}
