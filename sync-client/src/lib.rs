//! # sync-client
//!
//! Offline sync queue for the Cleanout mobile client.
//!
//! This is the library the app uses to keep working while the backend is
//! unreachable.
//!
//! ## Features
//!
//! - **Durable Queue**: operations survive restarts (file, SQLite or memory storage)
//! - **Replay**: FIFO replay with per-operation failure isolation and a single-flight guard
//! - **Gateway Abstraction**: pluggable backend (REST over reqwest, mock)
//! - **Connectivity Monitor**: periodic health check that drains the queue when online
//! - **Pure Queue Logic**: uses sync-core for side-effect-free bookkeeping
//!
//! ## Example
//!
//! ```ignore
//! use cleanout_sync_client::{GatewayConfig, HttpGateway, QueueStore, SyncService};
//!
//! let gateway = HttpGateway::new(GatewayConfig::default())?;
//! let service = Arc::new(SyncService::new(gateway, QueueStore::in_memory()));
//! service.init().await;
//!
//! // Queue a room capture while offline
//! service.add_to_queue(OperationType::Create, EntityType::Room, "", payload).await?;
//!
//! // Replay once the backend is back
//! let report = service.process_queue().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod gateway;
pub mod monitor;
pub mod service;
pub mod storage;

pub use config::{GatewayConfig, DEFAULT_BASE_URL, DEFAULT_CHECK_INTERVAL};
pub use gateway::{probe, BackendGateway, GatewayCall, GatewayError, HttpGateway, MockGateway};
pub use monitor::{spawn_connectivity_monitor, ConnectivityStatus, MonitorHandle};
pub use service::SyncService;
pub use storage::{
    FileStore, KeyValueStore, MemoryStore, QueueStore, SqliteStore, StoreError, AUTH_TOKEN_KEY,
    SYNC_QUEUE_KEY,
};

pub use cleanout_sync_core::SyncReport;
pub use cleanout_sync_types as types;
