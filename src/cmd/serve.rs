//! Dashboard API server command — `copydesk serve`.

use std::path::PathBuf;

use anyhow::Result;

pub async fn cmd_serve(port: u16, db_path: PathBuf, init: bool, dev: bool) -> Result<()> {
    if init {
        // Just initialize the database
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        copydesk::dashboard::db::ContentDb::new(&db_path)?;
        println!("Content database initialized at {}", db_path.display());
        return Ok(());
    }

    let config = copydesk::config::Config::load(port, db_path, dev)?;
    copydesk::dashboard::server::start_server(config).await?;

    Ok(())
}
