//! Opens the queue store and sync service described by the config.

use anyhow::{Context, Result};
use cleanout_sync_client::{
    FileStore, HttpGateway, KeyValueStore, MemoryStore, QueueStore, SqliteStore, SyncService,
};
use std::path::Path;
use std::sync::Arc;

use crate::config::{Config, StorageBackend};

/// Everything a command needs.
pub struct App {
    /// Loaded configuration.
    pub config: Config,
    /// Key-value store holding the queue and the auth token.
    pub kv: Arc<dyn KeyValueStore>,
    /// Initialized sync service.
    pub service: Arc<SyncService<HttpGateway>>,
}

impl App {
    /// Open storage, build the gateway and initialize the service.
    pub async fn open(config: Config, data_dir: &Path) -> Result<Self> {
        let kv = open_store(&config, data_dir).await?;
        let gateway = HttpGateway::new(config.backend.gateway_config())
            .context("Failed to build HTTP client")?
            .with_token_store(kv.clone());

        let service = Arc::new(SyncService::new(gateway, QueueStore::new(kv.clone())));
        service.init().await;

        Ok(Self {
            config,
            kv,
            service,
        })
    }
}

/// Open the configured key-value store.
pub async fn open_store(config: &Config, data_dir: &Path) -> Result<Arc<dyn KeyValueStore>> {
    let namespace = config.storage.namespace.as_str();
    let store: Arc<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::File => Arc::new(
            FileStore::open(data_dir, namespace)
                .await
                .context("Failed to open queue directory")?,
        ),
        StorageBackend::Sqlite => {
            let path = data_dir.join(&config.storage.database);
            Arc::new(
                SqliteStore::new(&path, namespace)
                    .await
                    .with_context(|| format!("Failed to open database {}", path.display()))?,
            )
        }
        StorageBackend::Memory => {
            tracing::warn!("memory storage selected, queue will not survive this command");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}
