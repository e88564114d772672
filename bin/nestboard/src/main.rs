//! # Nestboard Binary
//!
//! The entry point that assembles the application: settings, tracing, a
//! store implementation, and the HTTP router.

mod config;

use anyhow::Context;
use nb_api::AppState;
use nb_core::BoardStore;
use nb_store_memory::MemoryBoardStore;
use nb_store_sqlite::SqliteBoardStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = config::Settings::load().context("loading settings")?;

    // 1. Pick the store implementation.
    let store: Arc<dyn BoardStore> = match &settings.database_url {
        Some(url) => {
            info!(%url, "using sqlite store");
            Arc::new(SqliteBoardStore::connect(url).await?)
        }
        None => {
            info!("no database configured, using in-memory store");
            Arc::new(MemoryBoardStore::new())
        }
    };

    // 2. Wire the router and serve.
    let app = nb_api::router(Arc::new(AppState { store }));
    let listener = tokio::net::TcpListener::bind(&settings.listen)
        .await
        .with_context(|| format!("binding {}", settings.listen))?;
    info!("nestboard listening on http://{}", settings.listen);
    axum::serve(listener, app).await?;
    Ok(())
}
