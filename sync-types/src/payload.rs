//! Replay payloads.
//!
//! Each variant of [`Payload`] carries exactly the fields needed to replay
//! one `(entity type, operation type)` pair against the backend. On disk a
//! payload is the `data` object of a queued operation; decoding is driven
//! by the pair stored next to it, see [`Payload::from_data`].

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::SyncError;
use crate::operation::{EntityType, OperationType};
use crate::records::{JobStatus, SizeClass, WorkloadClass};

/// Fields for creating a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    /// Display name.
    pub name: String,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Partial customer update. Unset fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerChanges {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// New postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Fields for creating a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    /// Customer the job belongs to.
    pub customer_id: String,
    /// Address of the property to clear out.
    pub property_address: String,
    /// Planned date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,
    /// Free-form crew notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial job update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobChanges {
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    /// Rescheduled date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,
    /// Completion date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,
    /// Estimate after a human review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_adjusted_estimate: Option<f64>,
    /// Replacement notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A captured room waiting to be uploaded for classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoom {
    /// Job the room belongs to.
    pub job_id: String,
    /// Room label, e.g. "Master Bedroom".
    pub room_name: String,
    /// Sequence number within the job.
    pub room_number: u32,
    /// Local reference to the captured photo (path or `file://` URI).
    pub image_uri: String,
}

/// Human correction of a room's AI classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomOverride {
    /// Corrected size class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_size_class: Option<SizeClass>,
    /// Corrected workload class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_workload_class: Option<WorkloadClass>,
    /// Why the crew overrode the classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_override_reason: Option<String>,
}

/// Replay data for one queued operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `POST /api/customers`
    CreateCustomer(NewCustomer),
    /// `PATCH /api/customers/{id}`
    UpdateCustomer(CustomerChanges),
    /// `DELETE /api/customers/{id}`
    DeleteCustomer,
    /// `POST /api/jobs`
    CreateJob(NewJob),
    /// `PATCH /api/jobs/{id}`
    UpdateJob(JobChanges),
    /// `DELETE /api/jobs/{id}`
    DeleteJob,
    /// `POST /api/rooms` (multipart upload)
    CreateRoom(NewRoom),
    /// `PATCH /api/rooms/{id}`
    UpdateRoom(RoomOverride),
    /// `DELETE /api/rooms/{id}`
    DeleteRoom,
}

impl Payload {
    /// Entity type this payload targets.
    pub fn entity_type(&self) -> EntityType {
        match self {
            Payload::CreateCustomer(_) | Payload::UpdateCustomer(_) | Payload::DeleteCustomer => {
                EntityType::Customer
            }
            Payload::CreateJob(_) | Payload::UpdateJob(_) | Payload::DeleteJob => EntityType::Job,
            Payload::CreateRoom(_) | Payload::UpdateRoom(_) | Payload::DeleteRoom => {
                EntityType::Room
            }
        }
    }

    /// Operation type this payload performs.
    pub fn operation_type(&self) -> OperationType {
        match self {
            Payload::CreateCustomer(_) | Payload::CreateJob(_) | Payload::CreateRoom(_) => {
                OperationType::Create
            }
            Payload::UpdateCustomer(_) | Payload::UpdateJob(_) | Payload::UpdateRoom(_) => {
                OperationType::Update
            }
            Payload::DeleteCustomer | Payload::DeleteJob | Payload::DeleteRoom => {
                OperationType::Delete
            }
        }
    }

    /// The delete payload for `entity_type`.
    pub fn delete(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::Customer => Payload::DeleteCustomer,
            EntityType::Job => Payload::DeleteJob,
            EntityType::Room => Payload::DeleteRoom,
        }
    }

    /// Encode as the stored `data` object. Deletes encode as `{}`.
    pub fn to_data(&self) -> Value {
        let encoded = match self {
            Payload::CreateCustomer(p) => serde_json::to_value(p),
            Payload::UpdateCustomer(p) => serde_json::to_value(p),
            Payload::CreateJob(p) => serde_json::to_value(p),
            Payload::UpdateJob(p) => serde_json::to_value(p),
            Payload::CreateRoom(p) => serde_json::to_value(p),
            Payload::UpdateRoom(p) => serde_json::to_value(p),
            Payload::DeleteCustomer | Payload::DeleteJob | Payload::DeleteRoom => {
                return Value::Object(Default::default())
            }
        };
        // Plain structs of strings, numbers and dates always encode.
        encoded.unwrap_or_else(|_| Value::Object(Default::default()))
    }

    /// Decode a stored `data` object for the given pair.
    ///
    /// Delete payloads ignore whatever `data` holds.
    pub fn from_data(
        operation_type: OperationType,
        entity_type: EntityType,
        data: Value,
    ) -> Result<Self, SyncError> {
        fn decode<T: DeserializeOwned>(
            operation_type: OperationType,
            entity_type: EntityType,
            data: Value,
        ) -> Result<T, SyncError> {
            serde_json::from_value(data).map_err(|source| SyncError::InvalidPayload {
                operation_type,
                entity_type,
                source,
            })
        }

        let (op, entity) = (operation_type, entity_type);
        Ok(match (entity, op) {
            (EntityType::Customer, OperationType::Create) => {
                Payload::CreateCustomer(decode(op, entity, data)?)
            }
            (EntityType::Customer, OperationType::Update) => {
                Payload::UpdateCustomer(decode(op, entity, data)?)
            }
            (EntityType::Job, OperationType::Create) => Payload::CreateJob(decode(op, entity, data)?),
            (EntityType::Job, OperationType::Update) => Payload::UpdateJob(decode(op, entity, data)?),
            (EntityType::Room, OperationType::Create) => {
                Payload::CreateRoom(decode(op, entity, data)?)
            }
            (EntityType::Room, OperationType::Update) => {
                Payload::UpdateRoom(decode(op, entity, data)?)
            }
            (entity, OperationType::Delete) => Payload::delete(entity),
        })
    }
}
