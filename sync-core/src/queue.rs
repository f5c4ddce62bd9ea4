//! Operation queue for the offline sync service.
//!
//! This module provides the ordered list of deferred operations with:
//! - FIFO ordering for replay
//! - Synced tracking (operations replayed but not yet dropped)
//! - Id uniqueness across the lifetime of the queue
//!
//! The queue is used by sync-client's `SyncService`, which mirrors it to
//! durable storage after every mutation. Operations are pushed, replayed
//! from a [`pending`](OperationQueue::pending) snapshot, marked synced, and
//! finally dropped by [`retain_unsynced`](OperationQueue::retain_unsynced).

use std::collections::HashSet;

use cleanout_sync_types::{OperationId, SyncOperation};

/// Error type for queue operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// An operation with this id is already queued.
    DuplicateId {
        /// The conflicting id.
        id: OperationId,
    },
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::DuplicateId { id } => {
                write!(f, "operation already queued: {}", id)
            }
        }
    }
}

impl std::error::Error for QueueError {}

/// Ordered queue of deferred operations.
#[derive(Debug, Clone, Default)]
pub struct OperationQueue {
    operations: Vec<SyncOperation>,
}

impl OperationQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from persisted operations, keeping their order.
    ///
    /// Later duplicates of an id are dropped.
    pub fn from_operations(operations: Vec<SyncOperation>) -> Self {
        let mut queue = Self::new();
        queue.extend_unique(operations);
        queue
    }

    /// Append an operation at the tail.
    ///
    /// Returns an error if an operation with the same id is queued.
    pub fn push(&mut self, operation: SyncOperation) -> Result<(), QueueError> {
        if self.contains(operation.id()) {
            return Err(QueueError::DuplicateId {
                id: operation.id().clone(),
            });
        }
        self.operations.push(operation);
        Ok(())
    }

    /// Place previously persisted operations ahead of the current contents.
    ///
    /// Used when storage finishes loading after operations were already
    /// queued in memory. Returns how many loaded operations were kept.
    pub fn restore_front(&mut self, loaded: Vec<SyncOperation>) -> usize {
        let queued = std::mem::take(&mut self.operations);
        let kept = self.extend_unique(loaded);
        self.extend_unique(queued);
        kept
    }

    /// Check whether an id is queued.
    pub fn contains(&self, id: &OperationId) -> bool {
        self.operations.iter().any(|op| op.id() == id)
    }

    /// Snapshot of unsynced operations in queue order.
    pub fn pending(&self) -> Vec<SyncOperation> {
        self.operations
            .iter()
            .filter(|op| !op.is_synced())
            .cloned()
            .collect()
    }

    /// Number of unsynced operations.
    pub fn pending_count(&self) -> usize {
        self.operations.iter().filter(|op| !op.is_synced()).count()
    }

    /// Mark the operation with `id` as synced.
    ///
    /// Returns false if no such operation is queued (e.g. it was cleared
    /// while its replay was in flight).
    pub fn mark_synced(&mut self, id: &OperationId) -> bool {
        match self.operations.iter_mut().find(|op| op.id() == id) {
            Some(op) => {
                op.mark_synced();
                true
            }
            None => false,
        }
    }

    /// Drop every synced operation. Returns how many were removed.
    pub fn retain_unsynced(&mut self) -> usize {
        let before = self.operations.len();
        self.operations.retain(|op| !op.is_synced());
        before - self.operations.len()
    }

    /// All queued operations, synced or not, in order.
    pub fn operations(&self) -> &[SyncOperation] {
        &self.operations
    }

    /// Total number of queued operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.operations.clear();
    }

    fn extend_unique(&mut self, operations: Vec<SyncOperation>) -> usize {
        let mut seen: HashSet<OperationId> =
            self.operations.iter().map(|op| op.id().clone()).collect();
        let mut kept = 0;
        for op in operations {
            if seen.insert(op.id().clone()) {
                self.operations.push(op);
                kept += 1;
            }
        }
        kept
    }
}
