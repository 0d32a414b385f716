pub mod error;
pub mod gateway;

use crate::infra::config::{Config, StorageBackend};
use crate::storage::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

/// Opens the configured storage backend and makes sure its collections exist.
pub async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.storage {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when STORAGE_BACKEND=postgres")?;
            let store = PgDocumentStore::connect(url, config.max_connections)
                .await
                .context("failed to connect to PostgreSQL")?;
            Arc::new(store)
        }
        StorageBackend::Memory => {
            warn!("using in-memory storage; data is lost on restart");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    store
        .ensure_collections()
        .await
        .context("failed to prepare collections")?;
    info!(backend = ?config.storage, "storage ready");
    Ok(store)
}
