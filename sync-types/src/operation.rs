//! The queued operation model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::SyncError;
use crate::ids::OperationId;
use crate::payload::Payload;

/// Kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Create a new entity.
    Create,
    /// Modify an existing entity.
    Update,
    /// Remove an existing entity.
    Delete,
}

impl OperationType {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Create => "create",
            OperationType::Update => "update",
            OperationType::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(OperationType::Create),
            "update" => Ok(OperationType::Update),
            "delete" => Ok(OperationType::Delete),
            other => Err(SyncError::UnknownOperationType(other.to_string())),
        }
    }
}

/// Kind of entity an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// A customer.
    Customer,
    /// A cleanout job.
    Job,
    /// A photographed room within a job.
    Room,
}

impl EntityType {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Customer => "customer",
            EntityType::Job => "job",
            EntityType::Room => "room",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(EntityType::Customer),
            "job" => Ok(EntityType::Job),
            "room" => Ok(EntityType::Room),
            other => Err(SyncError::UnknownEntityType(other.to_string())),
        }
    }
}

/// One deferred mutation.
///
/// Built with [`SyncOperation::new`], which rejects payloads that do not
/// fit the declared pair. Serializes to the queue's stored JSON shape:
///
/// ```json
/// {"id": "...", "operation_type": "create", "entity_type": "room",
///  "entity_id": "", "data": {...}, "timestamp": "...", "synced": false}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredOperation", into = "StoredOperation")]
pub struct SyncOperation {
    id: OperationId,
    operation_type: OperationType,
    entity_type: EntityType,
    entity_id: String,
    payload: Payload,
    created_at: DateTime<Utc>,
    synced: bool,
}

impl SyncOperation {
    /// Build an unsynced operation stamped with the current time.
    pub fn new(
        operation_type: OperationType,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        payload: Payload,
    ) -> Result<Self, SyncError> {
        Self::new_at(operation_type, entity_type, entity_id, payload, Utc::now())
    }

    /// Build an unsynced operation stamped with `at`.
    pub fn new_at(
        operation_type: OperationType,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        payload: Payload,
        at: DateTime<Utc>,
    ) -> Result<Self, SyncError> {
        let entity_id = entity_id.into();
        validate(operation_type, entity_type, &entity_id, &payload)?;
        Ok(Self {
            id: OperationId::generate_at(at),
            operation_type,
            entity_type,
            entity_id,
            payload,
            created_at: at,
            synced: false,
        })
    }

    /// Replace the generated id.
    pub fn with_id(mut self, id: OperationId) -> Self {
        self.id = id;
        self
    }

    /// Operation id.
    pub fn id(&self) -> &OperationId {
        &self.id
    }

    /// Kind of mutation.
    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    /// Kind of target entity.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Server-side id of the target; empty for a pending create.
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Replay data.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// When the operation was enqueued.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the operation has been replayed successfully.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Record a successful replay.
    ///
    /// Queued operations live inside the sync service and are only handed
    /// out as clones, so calling this on a snapshot never changes what is
    /// queued. The service's queue is the one caller that matters.
    pub fn mark_synced(&mut self) {
        self.synced = true;
    }
}

fn validate(
    operation_type: OperationType,
    entity_type: EntityType,
    entity_id: &str,
    payload: &Payload,
) -> Result<(), SyncError> {
    if payload.operation_type() != operation_type || payload.entity_type() != entity_type {
        return Err(SyncError::PayloadMismatch {
            operation_type,
            entity_type,
            payload_operation: payload.operation_type(),
            payload_entity: payload.entity_type(),
        });
    }
    if operation_type != OperationType::Create && entity_id.trim().is_empty() {
        return Err(SyncError::MissingEntityId {
            operation_type,
            entity_type,
        });
    }
    Ok(())
}

/// Stored JSON shape of a [`SyncOperation`].
#[derive(Serialize, Deserialize)]
struct StoredOperation {
    id: OperationId,
    operation_type: OperationType,
    entity_type: EntityType,
    #[serde(default)]
    entity_id: String,
    #[serde(default)]
    data: Value,
    #[serde(rename = "timestamp", alias = "created_at")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    synced: bool,
}

impl TryFrom<StoredOperation> for SyncOperation {
    type Error = SyncError;

    fn try_from(stored: StoredOperation) -> Result<Self, Self::Error> {
        let payload = Payload::from_data(stored.operation_type, stored.entity_type, stored.data)?;
        validate(
            stored.operation_type,
            stored.entity_type,
            &stored.entity_id,
            &payload,
        )?;
        Ok(Self {
            id: stored.id,
            operation_type: stored.operation_type,
            entity_type: stored.entity_type,
            entity_id: stored.entity_id,
            payload,
            created_at: stored.created_at,
            synced: stored.synced,
        })
    }
}

impl From<SyncOperation> for StoredOperation {
    fn from(op: SyncOperation) -> Self {
        Self {
            data: op.payload.to_data(),
            id: op.id,
            operation_type: op.operation_type,
            entity_type: op.entity_type,
            entity_id: op.entity_id,
            created_at: op.created_at,
            synced: op.synced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{NewRoom, RoomOverride};
    use serde_json::json;

    fn garage() -> Payload {
        Payload::CreateRoom(NewRoom {
            job_id: "J1".into(),
            room_name: "Garage".into(),
            room_number: 3,
            image_uri: "/photos/garage.jpg".into(),
        })
    }

    #[test]
    fn new_operation_is_unsynced() {
        let op = SyncOperation::new(OperationType::Create, EntityType::Room, "", garage()).unwrap();

        assert!(!op.is_synced());
        assert_eq!(op.entity_id(), "");
        assert!(op
            .id()
            .as_str()
            .starts_with(&op.created_at().timestamp_millis().to_string()));
    }

    #[test]
    fn mismatched_payload_is_rejected() {
        let result = SyncOperation::new(OperationType::Create, EntityType::Job, "", garage());
        assert!(matches!(result, Err(SyncError::PayloadMismatch { .. })));
    }

    #[test]
    fn update_without_entity_id_is_rejected() {
        let result = SyncOperation::new(
            OperationType::Update,
            EntityType::Room,
            "  ",
            Payload::UpdateRoom(RoomOverride::default()),
        );
        assert!(matches!(result, Err(SyncError::MissingEntityId { .. })));
    }

    #[test]
    fn decodes_mobile_client_queue_entry() {
        let stored = json!({
            "id": "1718006400000_k3j9x0abc",
            "operation_type": "create",
            "entity_type": "room",
            "entity_id": "",
            "data": {
                "job_id": "J1",
                "room_name": "Garage",
                "room_number": 3,
                "image_uri": "/photos/garage.jpg"
            },
            "timestamp": "2024-06-10T08:00:00.000Z",
            "synced": false
        });

        let op: SyncOperation = serde_json::from_value(stored).unwrap();
        assert_eq!(op.id().as_str(), "1718006400000_k3j9x0abc");
        assert_eq!(op.payload(), &garage());
        assert!(!op.is_synced());
    }

    #[test]
    fn encodes_payload_as_data_and_time_as_timestamp() {
        let op = SyncOperation::new(
            OperationType::Delete,
            EntityType::Job,
            "J7",
            Payload::DeleteJob,
        )
        .unwrap();

        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["data"], json!({}));
        assert_eq!(value["entity_id"], "J7");
        assert!(value.get("timestamp").is_some());
        assert!(value.get("payload").is_none());
    }

    #[test]
    fn stored_delete_without_entity_id_fails_to_decode() {
        let stored = json!({
            "id": "x",
            "operation_type": "delete",
            "entity_type": "room",
            "entity_id": "",
            "data": {},
            "timestamp": "2024-06-10T08:00:00Z",
            "synced": false
        });

        assert!(serde_json::from_value::<SyncOperation>(stored).is_err());
    }

    #[test]
    fn mark_synced_sets_flag() {
        let mut op =
            SyncOperation::new(OperationType::Create, EntityType::Room, "", garage()).unwrap();
        op.mark_synced();
        assert!(op.is_synced());
    }

    #[test]
    fn enum_names_parse() {
        assert_eq!("room".parse::<EntityType>().unwrap(), EntityType::Room);
        assert_eq!(
            "update".parse::<OperationType>().unwrap(),
            OperationType::Update
        );
        assert!("invoice".parse::<EntityType>().is_err());
    }
}
