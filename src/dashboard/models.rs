use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One row of the `content` table: a named section of editable site copy.
///
/// `data` is an opaque JSON document whose schema belongs to the section's
/// renderer, not to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRow {
    pub id: i64,
    pub section: String,
    pub data: serde_json::Value,
    pub published: bool,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw row as read from SQLite, before the `data` column is parsed.
pub(crate) struct ContentRowRaw {
    pub id: i64,
    pub section: String,
    pub data: String,
    pub published: bool,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ContentRowRaw {
    pub fn into_row(self) -> Result<ContentRow> {
        let data = serde_json::from_str(&self.data)
            .with_context(|| format!("Invalid JSON stored for section '{}'", self.section))?;
        Ok(ContentRow {
            id: self.id,
            section: self.section,
            data,
            published: self.published,
            published_at: self.published_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
