//! `petclinicd` — the pet clinic server binary.
//!
//! Usage:
//!   petclinicd [-c <context-name-or-path>] [--listen <addr>] [--data-dir <dir>]
//!
//! The context name resolves to `/etc/petclinic/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod config;
mod routes;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use petclinic_sql::{SqlStore, SqliteStore};

use config::ServerConfig;

/// Pet clinic server.
#[derive(Parser, Debug)]
#[command(name = "petclinicd", about = "Pet clinic server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Listen address (overrides the config file).
    #[arg(long = "listen")]
    listen: Option<String>,

    /// Data directory (overrides the config file).
    #[arg(long = "data-dir")]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let mut server_config = match &cli.config {
        Some(name_or_path) => {
            let config_path = ServerConfig::resolve_path(name_or_path);
            info!("Loading configuration from {}", config_path.display());
            ServerConfig::load(&config_path)?
        }
        None => ServerConfig::default(),
    };
    if let Some(listen) = cli.listen {
        server_config.listen = listen;
    }
    if let Some(data_dir) = cli.data_dir {
        server_config.storage.data_dir = data_dir;
    }

    // Initialize storage.
    let data_dir = PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = petclinic_core::ServiceConfig {
        data_dir: Some(data_dir),
        listen: server_config.listen.clone(),
        ..Default::default()
    };

    let sql: Box<dyn SqlStore> = Box::new(
        SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    let owners_module = owners::OwnersModule::new(sql)?;
    info!("Owners module initialized");

    let app = routes::build_router(&[&owners_module]);

    let listener = tokio::net::TcpListener::bind(&server_config.listen).await?;
    info!("Listening on {}", server_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
