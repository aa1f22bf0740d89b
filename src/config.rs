//! Runtime configuration, loaded from the environment.
//!
//! A `.env` file is honored when present (`dotenvy` is loaded in `main`).
//! CLI flags cover the server-shape settings (port, database path, dev
//! mode); everything secret or deployment-specific comes from env vars:
//!
//! | Variable              | Meaning                                | Default |
//! |-----------------------|----------------------------------------|---------|
//! | `GITHUB_TOKEN`        | token for the live-site repository     | (required) |
//! | `GITHUB_OWNER`        | repository owner                       | (required) |
//! | `GITHUB_REPO`         | repository name                        | (required) |
//! | `GITHUB_BRANCH`       | branch commits land on                 | `main`  |
//! | `ADMIN_SESSION_TOKEN` | bearer token the dashboard UI presents | (required) |

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Target repository for published content.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl GitHubConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            token: std::env::var("GITHUB_TOKEN")
                .context("GITHUB_TOKEN must be set to publish content")?,
            owner: std::env::var("GITHUB_OWNER").context("GITHUB_OWNER must be set")?,
            repo: std::env::var("GITHUB_REPO").context("GITHUB_REPO must be set")?,
            branch: std::env::var("GITHUB_BRANCH").unwrap_or_else(|_| "main".to_string()),
        })
    }
}

/// Full runtime configuration for the `serve` command.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub dev_mode: bool,
    /// Token every `/api/*` request must present as `Authorization: Bearer`.
    pub session_token: String,
    pub github: GitHubConfig,
}

impl Config {
    pub fn load(port: u16, db_path: PathBuf, dev_mode: bool) -> Result<Self> {
        let session_token = std::env::var("ADMIN_SESSION_TOKEN")
            .context("ADMIN_SESSION_TOKEN must be set; API requests are rejected without it")?;
        Ok(Self {
            port,
            db_path,
            dev_mode,
            session_token,
            github: GitHubConfig::from_env()?,
        })
    }
}
