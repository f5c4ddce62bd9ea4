//! SyncService - the offline operation queue.
//!
//! This module provides [`SyncService`], which buffers mutations made while
//! the backend is unreachable and replays them once it comes back.
//!
//! # Architecture
//!
//! The service owns an [`OperationQueue`] (pure logic from sync-core),
//! mirrors it to a [`QueueStore`] after every mutation, and replays pending
//! operations through a [`BackendGateway`].
//!
//! ```text
//! UI action → add_to_queue → OperationQueue → QueueStore
//!                                  ↓
//! timer / refresh → process_queue → BackendGateway → REST backend
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cleanout_sync_client::{HttpGateway, GatewayConfig, QueueStore, SyncService};
//!
//! let gateway = HttpGateway::new(GatewayConfig::new("https://api.example.com"))?;
//! let service = Arc::new(SyncService::new(gateway, QueueStore::in_memory()));
//! service.init().await;
//!
//! service.add_to_queue(OperationType::Create, EntityType::Room, "", payload).await?;
//! let report = service.process_queue().await;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use cleanout_sync_core::{OperationQueue, SyncReport};
use cleanout_sync_types::{
    EntityType, OperationId, OperationType, Payload, SyncError, SyncOperation,
};
use tokio::sync::Mutex;

use crate::gateway::{probe, BackendGateway, GatewayError};
use crate::monitor::ConnectivityStatus;
use crate::storage::QueueStore;

/// Offline sync queue service.
///
/// Construct once per process, share by `Arc`, and call [`init`](Self::init)
/// before relying on persisted state. Only the service mutates the queue.
pub struct SyncService<G: BackendGateway> {
    gateway: G,
    store: QueueStore,
    queue: Mutex<OperationQueue>,
    syncing: AtomicBool,
    initialized: AtomicBool,
}

impl<G: BackendGateway> SyncService<G> {
    /// Create a service with an empty in-memory queue.
    pub fn new(gateway: G, store: QueueStore) -> Self {
        Self {
            gateway,
            store,
            queue: Mutex::new(OperationQueue::new()),
            syncing: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
        }
    }

    /// Load the persisted queue.
    ///
    /// Operations enqueued before `init` stay queued behind the loaded ones.
    /// Until `init` completes nothing is written to the store, so an early
    /// enqueue cannot overwrite the persisted queue. Calling `init` again is
    /// a no-op.
    pub async fn init(&self) {
        let mut queue = self.queue.lock().await;
        if self.initialized.load(Ordering::Acquire) {
            tracing::debug!("sync queue already initialized");
            return;
        }

        let queued_early = queue.len();
        let loaded = self.store.load().await;
        let kept = queue.restore_front(loaded);
        self.initialized.store(true, Ordering::Release);

        tracing::info!(
            loaded = kept,
            pending = queue.pending_count(),
            "sync queue initialized"
        );
        if queued_early > 0 {
            self.persist(&queue).await;
        }
    }

    /// Whether [`init`](Self::init) has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Queue an operation and persist the queue.
    ///
    /// Returns the new operation's id. The only error is a malformed
    /// operation (payload not matching the types, or a missing entity id),
    /// in which case nothing is queued. Persistence failures are logged; the
    /// operation still lives in memory for this session.
    pub async fn add_to_queue(
        &self,
        operation_type: OperationType,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        payload: Payload,
    ) -> Result<OperationId, SyncError> {
        let mut operation = SyncOperation::new(operation_type, entity_type, entity_id, payload)?;

        let mut queue = self.queue.lock().await;
        while queue.contains(operation.id()) {
            operation = operation.with_id(OperationId::generate());
        }
        let id = operation.id().clone();
        if let Err(e) = queue.push(operation) {
            tracing::error!(error = %e, "failed to queue operation");
            return Ok(id);
        }

        tracing::info!(
            id = %id,
            operation = %operation_type,
            entity = %entity_type,
            pending = queue.pending_count(),
            "operation queued"
        );
        self.persist(&queue).await;
        Ok(id)
    }

    /// Replay every pending operation.
    ///
    /// Returns `{0, 0}` without touching the network when a pass is already
    /// running or nothing is pending, and without attempting anything when
    /// the backend is unhealthy. A failed operation stays queued and does
    /// not stop the rest of the pass.
    pub async fn process_queue(&self) -> SyncReport {
        self.drain(true).await
    }

    /// Probe connectivity once and, if online, drain the queue.
    ///
    /// This is the manual pull-to-refresh; the connectivity monitor calls it
    /// on every tick.
    pub async fn refresh(&self) -> (ConnectivityStatus, SyncReport) {
        let online = probe(&self.gateway).await;
        let report = if online {
            self.drain(false).await
        } else {
            SyncReport::empty()
        };
        let status = ConnectivityStatus {
            online,
            pending: self.pending_count().await,
        };
        (status, report)
    }

    /// Number of operations not yet replayed.
    pub async fn pending_count(&self) -> usize {
        self.queue.lock().await.pending_count()
    }

    /// Snapshot of operations not yet replayed, oldest first.
    pub async fn pending_operations(&self) -> Vec<SyncOperation> {
        self.queue.lock().await.pending()
    }

    /// Drop operations already marked synced and persist.
    ///
    /// Returns how many were dropped.
    pub async fn clear_synced(&self) -> usize {
        let mut queue = self.queue.lock().await;
        let removed = queue.retain_unsynced();
        self.persist(&queue).await;
        tracing::info!(removed, "cleared synced operations");
        removed
    }

    /// Discard the whole queue and persist the empty state.
    ///
    /// Returns how many operations were discarded.
    pub async fn clear_all(&self) -> usize {
        let mut queue = self.queue.lock().await;
        let removed = queue.len();
        queue.clear();
        self.persist(&queue).await;
        tracing::warn!(removed, "cleared entire sync queue");
        removed
    }

    /// True while a replay pass is running.
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// The gateway operations are replayed through.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The durable store backing the queue.
    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    async fn drain(&self, probe_first: bool) -> SyncReport {
        let Some(_guard) = DrainGuard::acquire(&self.syncing) else {
            tracing::debug!("sync already in progress");
            return SyncReport::empty();
        };

        // The lock is released before any gateway call so enqueue never
        // waits on the network.
        let pending = {
            let queue = self.queue.lock().await;
            if queue.pending_count() == 0 {
                return SyncReport::empty();
            }
            queue.pending()
        };

        if probe_first && !probe(&self.gateway).await {
            tracing::info!(pending = pending.len(), "backend unreachable, sync deferred");
            return SyncReport::empty();
        }

        tracing::debug!(pending = pending.len(), "replaying queued operations");
        let mut report = SyncReport::empty();
        for operation in &pending {
            let applied = match self.replay(operation).await {
                Ok(()) => true,
                // A 2xx with an unreadable body was still applied; replaying
                // it would duplicate the write.
                Err(e) if e.was_applied() => {
                    tracing::warn!(
                        id = %operation.id(),
                        operation = %operation.operation_type(),
                        entity = %operation.entity_type(),
                        error = %e,
                        "backend accepted operation but its response was unreadable"
                    );
                    true
                }
                Err(e) => {
                    tracing::warn!(
                        id = %operation.id(),
                        operation = %operation.operation_type(),
                        entity = %operation.entity_type(),
                        error = %e,
                        "replay failed, operation stays queued"
                    );
                    false
                }
            };

            if applied {
                if !self.queue.lock().await.mark_synced(operation.id()) {
                    tracing::debug!(id = %operation.id(), "operation cleared during replay");
                }
                report.record_success();
            } else {
                report.record_failure();
            }
        }

        let mut queue = self.queue.lock().await;
        queue.retain_unsynced();
        self.persist(&queue).await;

        tracing::info!(
            success = report.success,
            failed = report.failed,
            pending = queue.pending_count(),
            "sync pass complete"
        );
        report
    }

    async fn replay(&self, operation: &SyncOperation) -> Result<(), GatewayError> {
        let key = operation.id();
        let target = operation.entity_id();
        match operation.payload() {
            Payload::CreateCustomer(customer) => {
                let created = self.gateway.create_customer(customer, key).await?;
                tracing::debug!(customer_id = %created.id, "customer created");
            }
            Payload::UpdateCustomer(changes) => {
                self.gateway.update_customer(target, changes, key).await?;
            }
            Payload::DeleteCustomer => self.gateway.delete_customer(target, key).await?,
            Payload::CreateJob(job) => {
                let created = self.gateway.create_job(job, key).await?;
                tracing::debug!(job_id = %created.id, "job created");
            }
            Payload::UpdateJob(changes) => {
                self.gateway.update_job(target, changes, key).await?;
            }
            Payload::DeleteJob => self.gateway.delete_job(target, key).await?,
            Payload::CreateRoom(room) => {
                let created = self.gateway.upload_room(room, key).await?;
                tracing::info!(
                    room_id = %created.id,
                    job_id = %room.job_id,
                    estimated_cost = created.estimated_cost,
                    "room uploaded"
                );
            }
            Payload::UpdateRoom(changes) => {
                self.gateway.override_room(target, changes, key).await?;
            }
            Payload::DeleteRoom => self.gateway.delete_room(target, key).await?,
        }
        Ok(())
    }

    /// Write the queue through. Skipped before `init` so the persisted queue
    /// is never replaced before it has been loaded.
    async fn persist(&self, queue: &OperationQueue) {
        if !self.initialized.load(Ordering::Acquire) {
            tracing::debug!("sync queue not initialized, keeping changes in memory");
            return;
        }
        if let Err(e) = self.store.save(queue.operations()).await {
            tracing::error!(error = %e, "failed to persist sync queue");
        }
    }
}

impl<G: BackendGateway> std::fmt::Debug for SyncService<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("syncing", &self.is_syncing())
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

/// Holds the single-flight flag for one pass; clears it on drop.
struct DrainGuard<'a>(&'a AtomicBool);

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
