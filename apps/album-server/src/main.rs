///! Raksha Bandhan Album Server
///! REST API for the memory album and its AI wishes, images and videos

mod api;
mod config;
mod models;
mod state;

#[cfg(test)]
mod tests;

use album::{AlbumStore, JsonDirStore, SqliteStore};
use anyhow::Context;
use generation::Generators;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ServerConfig, StoreKind};
use crate::state::{AppState, SharedStore};

const DEFAULT_LOG_FILTER: &str = "album_server=debug,generation=info,album=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Raksha Bandhan album server...");
    let config = ServerConfig::from_env()?;

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating {}", config.data_dir.display()))?;
    let store: SharedStore = match config.store {
        StoreKind::Json => Box::new(JsonDirStore::new(&config.data_dir)?),
        StoreKind::Sqlite => Box::new(SqliteStore::open_or_create(
            &config.data_dir.join("album.db"),
        )?),
    };
    info!(
        "Storage initialized at: {} ({:?})",
        config.data_dir.display(),
        config.store
    );

    let album = AlbumStore::open(store)?;
    let generators = Generators::gemini_from_env()?;
    let state = Arc::new(AppState::new(album, generators));
    let app = api::router(state);

    info!("Album server listening on http://{}", config.addr);
    info!("API endpoints:");
    info!("  POST /api/album                - Create album");
    info!("  GET  /api/album                - Album info and greeting");
    info!("  GET  /api/memories             - List memories");
    info!("  POST /api/memories             - Add memory");
    info!("  GET/PUT/DELETE /api/memories/:id");
    info!("  GET  /api/timeline             - Memories by year");
    info!("  POST /api/wish                 - Generate a wish");
    info!("  POST /api/memories/:id/image   - Generate an image");
    info!("  GET/POST /api/memories/:id/video - Latest video state / start a job");
    info!("  GET/DELETE /api/videos/:job    - Video job status / cancel");

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
