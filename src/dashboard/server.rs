use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::api::{self, AppState};
use super::db::{ContentDb, DbHandle};
use super::github::GitHubRemote;
use super::publisher::Publisher;
use super::remote::RemoteStore;
use crate::config::Config;

/// Build the application router on top of prepared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router().with_state(state)
}

/// Start the dashboard API server.
pub async fn start_server(config: Config) -> Result<()> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let db = ContentDb::new(&config.db_path).context("Failed to initialize content database")?;
    let remote: Arc<dyn RemoteStore> = Arc::new(GitHubRemote::new(config.github.clone()));

    let state = Arc::new(AppState {
        db: DbHandle::new(db),
        remote: Arc::clone(&remote),
        publisher: Publisher::new(remote),
        session_token: config.session_token.clone(),
    });

    let mut app = build_router(state);

    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if config.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(
        "copydesk serving http://{} (publishing to {}/{}@{})",
        local_addr, config.github.owner, config.github.repo, config.github.branch
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("shutting down...");
}
