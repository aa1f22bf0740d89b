use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "copydesk")]
#[command(version, about = "Admin back-end for publishing marketing-site content")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the dashboard API server
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "8787")]
        port: u16,

        /// Path to the content database
        #[arg(long, default_value = ".copydesk/content.db")]
        db: PathBuf,

        /// Initialize database only (don't start server)
        #[arg(long)]
        init: bool,

        /// Development mode (permissive CORS, bind on 0.0.0.0)
        #[arg(long)]
        dev: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "copydesk=debug"
    } else {
        "copydesk=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Serve {
            port,
            db,
            init,
            dev,
        } => cmd::serve::cmd_serve(port, db, init, dev).await,
    }
}
