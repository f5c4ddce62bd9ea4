//! Backend gateway abstraction.
//!
//! The sync service never talks HTTP directly. It replays operations
//! through a [`BackendGateway`], one method per entity/operation pair:
//!
//! - `health()` backs the connectivity probe
//! - `create_*`, `update_*`, `delete_*` replay customer and job mutations
//! - `upload_room()` performs the multipart room create
//!
//! Every replay method receives the operation id, which implementations
//! forward as an idempotency key so a supporting backend can dedupe retries.
//!
//! [`HttpGateway`] talks to the REST backend; [`MockGateway`] scripts
//! responses for tests.

mod http;
mod mock;

pub use http::HttpGateway;
pub use mock::{GatewayCall, MockGateway};

use async_trait::async_trait;
use cleanout_sync_types::{
    Customer, CustomerChanges, Job, JobChanges, NewCustomer, NewJob, NewRoom, OperationId,
    Room, RoomOverride,
};
use std::path::PathBuf;
use thiserror::Error;

/// Gateway errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Backend could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Any other transport failure.
    #[error("http error: {0}")]
    Http(String),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Room image could not be read from local storage.
    #[error("cannot read image {path}: {source}")]
    Image {
        /// Resolved local path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Backend accepted the request but the body did not match the
    /// expected record. The mutation has been applied server side.
    #[error("backend returned {status} with an unreadable body: {reason}")]
    Decode {
        /// HTTP status code, always 2xx.
        status: u16,
        /// What went wrong reading the body.
        reason: String,
    },
}

impl GatewayError {
    /// True when the backend applied the mutation despite the error, so
    /// the operation must not be replayed again.
    pub fn was_applied(&self) -> bool {
        matches!(self, GatewayError::Decode { .. })
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else if e.is_connect() {
            GatewayError::Connection(e.to_string())
        } else {
            GatewayError::Http(e.to_string())
        }
    }
}

/// REST backend as seen by the sync service.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// `GET /health`. `Ok(())` only for a 200 response.
    async fn health(&self) -> Result<(), GatewayError>;

    /// Create a customer.
    async fn create_customer(
        &self,
        customer: &NewCustomer,
        idempotency_key: &OperationId,
    ) -> Result<Customer, GatewayError>;

    /// Apply changes to a customer.
    async fn update_customer(
        &self,
        id: &str,
        changes: &CustomerChanges,
        idempotency_key: &OperationId,
    ) -> Result<Customer, GatewayError>;

    /// Delete a customer.
    async fn delete_customer(
        &self,
        id: &str,
        idempotency_key: &OperationId,
    ) -> Result<(), GatewayError>;

    /// Create a job.
    async fn create_job(
        &self,
        job: &NewJob,
        idempotency_key: &OperationId,
    ) -> Result<Job, GatewayError>;

    /// Apply changes to a job.
    async fn update_job(
        &self,
        id: &str,
        changes: &JobChanges,
        idempotency_key: &OperationId,
    ) -> Result<Job, GatewayError>;

    /// Delete a job.
    async fn delete_job(&self, id: &str, idempotency_key: &OperationId)
        -> Result<(), GatewayError>;

    /// Upload a room photo and create the room. The backend classifies it.
    async fn upload_room(
        &self,
        room: &NewRoom,
        idempotency_key: &OperationId,
    ) -> Result<Room, GatewayError>;

    /// Record a human override of a room's classification.
    async fn override_room(
        &self,
        id: &str,
        changes: &RoomOverride,
        idempotency_key: &OperationId,
    ) -> Result<Room, GatewayError>;

    /// Delete a room.
    async fn delete_room(
        &self,
        id: &str,
        idempotency_key: &OperationId,
    ) -> Result<(), GatewayError>;
}

/// Connectivity probe: true if the backend answers its health check.
///
/// Errors are swallowed; an unreachable backend is the normal offline case.
pub async fn probe<G: BackendGateway + ?Sized>(gateway: &G) -> bool {
    match gateway.health().await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "backend health check failed");
            false
        }
    }
}
