use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::db::DbHandle;
use super::publisher::Publisher;
use super::remote::{BatchFile, RemoteStore};
use super::render::SectionContent;
use crate::errors::{PublishError, RenderError};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    pub remote: Arc<dyn RemoteStore>,
    pub publisher: Publisher,
    pub session_token: String,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ContentQuery {
    pub section: Option<String>,
}

#[derive(Deserialize)]
pub struct PutContentRequest {
    pub section: Option<String>,
    pub data: Option<serde_json::Value>,
    pub published: Option<bool>,
}

#[derive(Deserialize)]
pub struct PublishRequest {
    pub section: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    Unauthorized,
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<PublishError> for ApiError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::NotFound { path } => {
                ApiError::NotFound(format!("Remote file not found: {}", path))
            }
            PublishError::Conflict(msg) => ApiError::Conflict(msg),
            PublishError::RemoteUnavailable(msg) => {
                error!("remote store unavailable: {}", msg);
                ApiError::Internal("Failed to publish content".to_string())
            }
            PublishError::Other(e) => {
                error!("publish failed: {:#}", e);
                ApiError::Internal("Failed to publish content".to_string())
            }
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::UnknownSection(section) => {
                ApiError::NotFound(format!("No renderer for section '{}'", section))
            }
            RenderError::BadData { .. } => ApiError::BadRequest(err.to_string()),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/content", get(get_content).put(put_content))
        .route("/api/content/publish", post(publish_content))
        .route("/api/upload-image", post(upload_image))
        .route("/health", get(health_check))
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Reject requests without an established session before any store access.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match presented {
        Some(token) if token == state.session_token => Ok(()),
        _ => {
            warn!("rejected request without a valid session");
            Err(ApiError::Unauthorized)
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn get_content(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<ContentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &headers)?;
    match query.section {
        Some(section) => {
            let row = state
                .db
                .call(move |db| db.get_section(&section))
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            // Absent sections serialize as JSON null, not 404: the
            // dashboard probes sections that have never been saved.
            Ok(Json(serde_json::to_value(row).unwrap_or_default()))
        }
        None => {
            let rows = state
                .db
                .call(|db| db.list_sections())
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            Ok(Json(
                serde_json::to_value(rows).unwrap_or_else(|_| serde_json::Value::Array(vec![])),
            ))
        }
    }
}

async fn put_content(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<PutContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &headers)?;

    let section = req.section.filter(|s| !s.is_empty());
    let data = req.data.filter(|d| !d.is_null());
    let (section, data) = match (section, data) {
        (Some(section), Some(data)) => (section, data),
        _ => {
            return Err(ApiError::BadRequest(
                "Section and data are required".to_string(),
            ));
        }
    };

    let published = req.published;
    let row = state
        .db
        .call(move |db| db.upsert_section(&section, &data, published))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(row))
}

async fn publish_content(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<PublishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &headers)?;

    let section = req
        .section
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Section is required".to_string()))?;

    let lookup = section.clone();
    let row = state
        .db
        .call(move |db| db.get_section(&lookup))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Content not found".to_string()))?;

    let content = SectionContent::parse(&row.section, &row.data)?;
    let message = format!("Update {} section via admin dashboard", section);
    let files = content.files();

    if let [path] = files {
        let rendered = content.clone();
        match state
            .publisher
            .publish_single_file(path, move |html| rendered.apply(html), &message)
            .await?
        {
            Some(commit) => info!(section = %section, commit = %commit, "published section"),
            None => info!(section = %section, "section already up to date on the live site"),
        }
    } else {
        // Each page is fetched fresh and rendered independently; the batch
        // then lands as a single commit.
        let mut batch = Vec::with_capacity(files.len());
        for path in files {
            let current = state.remote.get_file(path).await?;
            batch.push(BatchFile {
                path: path.to_string(),
                content: content.apply(&current.content),
            });
        }
        let commit = state.publisher.publish_multiple_files(&batch, &message).await?;
        info!(section = %section, commit = %commit, pages = files.len(), "published section");
    }

    // The row flips to published only once the remote commit is in; a
    // failed publish leaves the draft state untouched.
    state
        .db
        .call(move |db| db.mark_published(&section))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Content published successfully. Site will redeploy in ~30 seconds.",
    })))
}

async fn upload_image(
    State(state): State<SharedState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    authorize(&state, &headers)?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
            upload = Some((name, bytes.to_vec()));
            break;
        }
    }

    let Some((name, bytes)) = upload else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"success": false, "error": "No file provided"})),
        )
            .into_response());
    };

    let message = format!("Upload image: {} via admin dashboard", name);
    match state
        .publisher
        .publish_binary_asset(&name, &bytes, &message)
        .await
    {
        Ok(path) => {
            let file_name = path.strip_prefix("images/").unwrap_or(&path).to_string();
            info!(path = %path, "uploaded image");
            Ok(Json(serde_json::json!({
                "success": true,
                "path": path,
                "fileName": file_name,
            }))
            .into_response())
        }
        Err(e) => {
            error!("image upload failed: {}", e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"success": false, "error": e.to_string()})),
            )
                .into_response())
        }
    }
}
