//! # sync-types
//!
//! Data model for the Cleanout offline sync queue.
//!
//! This crate provides the types shared by every Cleanout sync crate:
//! - [`SyncOperation`] - one deferred mutation, as queued and persisted
//! - [`Payload`] - typed replay data, one variant per entity/operation pair
//! - [`Customer`], [`Job`], [`Room`] - records returned by the backend
//! - [`OperationId`] - queue-unique operation identifier
//! - [`SyncError`] - validation and decoding errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod operation;
mod payload;
mod records;

pub use error::SyncError;
pub use ids::OperationId;
pub use operation::{EntityType, OperationType, SyncOperation};
pub use payload::{
    CustomerChanges, JobChanges, NewCustomer, NewJob, NewRoom, Payload, RoomOverride,
};
pub use records::{Customer, Job, JobStatus, Room, SizeClass, WorkloadClass};
