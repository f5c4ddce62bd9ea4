//! Error types for the operation model.

use crate::operation::{EntityType, OperationType};
use thiserror::Error;

/// Errors raised while building or decoding a [`SyncOperation`](crate::SyncOperation).
#[derive(Debug, Error)]
pub enum SyncError {
    /// The payload variant does not belong to the declared entity/operation pair.
    #[error("payload for {payload_entity} {payload_operation} does not match {entity_type} {operation_type}")]
    PayloadMismatch {
        /// Declared operation type.
        operation_type: OperationType,
        /// Declared entity type.
        entity_type: EntityType,
        /// Operation type the payload was built for.
        payload_operation: OperationType,
        /// Entity type the payload was built for.
        payload_entity: EntityType,
    },

    /// Update and delete operations need the server-side id of their target.
    #[error("{operation_type} {entity_type} requires an entity id")]
    MissingEntityId {
        /// Declared operation type.
        operation_type: OperationType,
        /// Declared entity type.
        entity_type: EntityType,
    },

    /// Stored `data` could not be decoded into the payload for its pair.
    #[error("invalid {operation_type} {entity_type} payload: {source}")]
    InvalidPayload {
        /// Declared operation type.
        operation_type: OperationType,
        /// Declared entity type.
        entity_type: EntityType,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Unrecognized entity type name.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// Unrecognized operation type name.
    #[error("unknown operation type: {0}")]
    UnknownOperationType(String),
}
