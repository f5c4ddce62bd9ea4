//! Mock gateway for testing.
//!
//! Records replay calls, scripts health and failures, and can hold replays
//! open so tests can observe a drain in progress.

use super::{BackendGateway, GatewayError};
use async_trait::async_trait;
use cleanout_sync_types::{
    Customer, CustomerChanges, Job, JobChanges, JobStatus, NewCustomer, NewJob, NewRoom,
    OperationId, Room, RoomOverride,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Notify};

/// One replay call seen by a [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
    /// Gateway method name, e.g. `"upload_room"`.
    pub method: &'static str,
    /// Target entity id for updates and deletes.
    pub target: Option<String>,
    /// Operation id sent as the idempotency key.
    pub idempotency_key: OperationId,
}

/// Mock gateway for testing.
///
/// Healthy by default; every replay succeeds unless scripted otherwise.
/// Clones share state.
#[derive(Debug, Clone)]
pub struct MockGateway {
    inner: Arc<Mutex<MockGatewayInner>>,
    gate: Arc<watch::Sender<bool>>,
    entered: Arc<Notify>,
}

#[derive(Debug)]
struct MockGatewayInner {
    healthy: bool,
    health_checks: usize,
    calls: Vec<GatewayCall>,
    failing: HashSet<OperationId>,
    fail_next_replay: Option<String>,
    room_response: Option<Room>,
    next_id: u64,
}

impl Default for MockGatewayInner {
    fn default() -> Self {
        Self {
            healthy: true,
            health_checks: 0,
            calls: Vec::new(),
            failing: HashSet::new(),
            fail_next_replay: None,
            room_response: None,
            next_id: 1,
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            inner: Arc::new(Mutex::new(MockGatewayInner::default())),
            gate: Arc::new(gate),
            entered: Arc::new(Notify::new()),
        }
    }
}

impl MockGateway {
    /// Create a healthy mock gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the health check pass or fail.
    pub fn set_healthy(&self, healthy: bool) {
        self.lock().healthy = healthy;
    }

    /// Number of health checks performed.
    pub fn health_checks(&self) -> usize {
        self.lock().health_checks
    }

    /// All replay calls, in the order they started.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    /// Idempotency keys of all replay calls, in order.
    pub fn replayed_ids(&self) -> Vec<OperationId> {
        self.lock()
            .calls
            .iter()
            .map(|call| call.idempotency_key.clone())
            .collect()
    }

    /// Fail every replay of the operation with `id` until cleared.
    pub fn fail_operation(&self, id: &OperationId) {
        self.lock().failing.insert(id.clone());
    }

    /// Stop failing the operation with `id`.
    pub fn clear_failure(&self, id: &OperationId) {
        self.lock().failing.remove(id);
    }

    /// Cause the next replay to fail with the given error.
    pub fn fail_next_replay(&self, error: &str) {
        self.lock().fail_next_replay = Some(error.to_string());
    }

    /// Room returned by `upload_room` instead of one derived from the request.
    pub fn set_room_response(&self, room: Room) {
        self.lock().room_response = Some(room);
    }

    /// Block replays after they are recorded, until [`release_replays`](Self::release_replays).
    pub fn hold_replays(&self) {
        self.gate.send_replace(true);
    }

    /// Let held and future replays complete.
    pub fn release_replays(&self) {
        self.gate.send_replace(false);
    }

    /// Wait until a replay call has started.
    pub async fn replay_started(&self) {
        self.entered.notified().await;
    }

    fn lock(&self) -> MutexGuard<'_, MockGatewayInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn replay<T>(
        &self,
        method: &'static str,
        target: Option<&str>,
        idempotency_key: &OperationId,
        respond: impl FnOnce(&mut MockGatewayInner) -> T + Send,
    ) -> Result<T, GatewayError> {
        self.lock().calls.push(GatewayCall {
            method,
            target: target.map(str::to_string),
            idempotency_key: idempotency_key.clone(),
        });
        self.entered.notify_one();

        let mut gate = self.gate.subscribe();
        // Sender lives in self, so this cannot observe a closed channel.
        let _ = gate.wait_for(|held| !*held).await;

        let mut inner = self.lock();
        if let Some(error) = inner.fail_next_replay.take() {
            return Err(GatewayError::Http(error));
        }
        if inner.failing.contains(idempotency_key) {
            return Err(GatewayError::Status {
                status: 500,
                body: format!("scripted failure for {}", idempotency_key),
            });
        }
        Ok(respond(&mut inner))
    }
}

impl MockGatewayInner {
    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{}-{}", prefix, self.next_id);
        self.next_id += 1;
        id
    }
}

#[async_trait]
impl BackendGateway for MockGateway {
    async fn health(&self) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        inner.health_checks += 1;
        if inner.healthy {
            Ok(())
        } else {
            Err(GatewayError::Connection("backend offline".into()))
        }
    }

    async fn create_customer(
        &self,
        customer: &NewCustomer,
        idempotency_key: &OperationId,
    ) -> Result<Customer, GatewayError> {
        self.replay("create_customer", None, idempotency_key, |inner| Customer {
            id: inner.next_id("customer"),
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            address: customer.address.clone(),
            created_at: None,
        })
        .await
    }

    async fn update_customer(
        &self,
        id: &str,
        changes: &CustomerChanges,
        idempotency_key: &OperationId,
    ) -> Result<Customer, GatewayError> {
        self.replay("update_customer", Some(id), idempotency_key, |_| Customer {
            id: id.to_string(),
            name: changes.name.clone().unwrap_or_default(),
            email: changes.email.clone(),
            phone: changes.phone.clone(),
            address: changes.address.clone(),
            created_at: None,
        })
        .await
    }

    async fn delete_customer(
        &self,
        id: &str,
        idempotency_key: &OperationId,
    ) -> Result<(), GatewayError> {
        self.replay("delete_customer", Some(id), idempotency_key, |_| ())
            .await
    }

    async fn create_job(
        &self,
        job: &NewJob,
        idempotency_key: &OperationId,
    ) -> Result<Job, GatewayError> {
        self.replay("create_job", None, idempotency_key, |inner| Job {
            id: inner.next_id("job"),
            customer_id: job.customer_id.clone(),
            job_number: None,
            status: JobStatus::Draft,
            property_address: Some(job.property_address.clone()),
            scheduled_date: job.scheduled_date.map(|d| d.to_rfc3339()),
            completed_date: None,
            base_estimate: 0.0,
            ai_estimate: 0.0,
            human_adjusted_estimate: None,
            final_price: 0.0,
            notes: job.notes.clone(),
        })
        .await
    }

    async fn update_job(
        &self,
        id: &str,
        changes: &JobChanges,
        idempotency_key: &OperationId,
    ) -> Result<Job, GatewayError> {
        self.replay("update_job", Some(id), idempotency_key, |_| Job {
            id: id.to_string(),
            customer_id: String::new(),
            job_number: None,
            status: changes.status.unwrap_or(JobStatus::Draft),
            property_address: None,
            scheduled_date: changes.scheduled_date.map(|d| d.to_rfc3339()),
            completed_date: changes.completed_date.map(|d| d.to_rfc3339()),
            base_estimate: 0.0,
            ai_estimate: 0.0,
            human_adjusted_estimate: changes.human_adjusted_estimate,
            final_price: 0.0,
            notes: changes.notes.clone(),
        })
        .await
    }

    async fn delete_job(
        &self,
        id: &str,
        idempotency_key: &OperationId,
    ) -> Result<(), GatewayError> {
        self.replay("delete_job", Some(id), idempotency_key, |_| ())
            .await
    }

    async fn upload_room(
        &self,
        room: &NewRoom,
        idempotency_key: &OperationId,
    ) -> Result<Room, GatewayError> {
        self.replay("upload_room", None, idempotency_key, |inner| {
            if let Some(response) = inner.room_response.clone() {
                return response;
            }
            Room {
                id: inner.next_id("room"),
                job_id: Some(room.job_id.clone()),
                name: Some(room.room_name.clone()),
                room_number: Some(room.room_number),
                image_url: None,
                ai_size_class: None,
                ai_workload_class: None,
                ai_confidence: None,
                final_size_class: None,
                final_workload_class: None,
                estimated_cost: 0.0,
            }
        })
        .await
    }

    async fn override_room(
        &self,
        id: &str,
        changes: &RoomOverride,
        idempotency_key: &OperationId,
    ) -> Result<Room, GatewayError> {
        self.replay("override_room", Some(id), idempotency_key, |_| Room {
            id: id.to_string(),
            job_id: None,
            name: None,
            room_number: None,
            image_url: None,
            ai_size_class: None,
            ai_workload_class: None,
            ai_confidence: None,
            final_size_class: changes.human_size_class,
            final_workload_class: changes.human_workload_class,
            estimated_cost: 0.0,
        })
        .await
    }

    async fn delete_room(
        &self,
        id: &str,
        idempotency_key: &OperationId,
    ) -> Result<(), GatewayError> {
        self.replay("delete_room", Some(id), idempotency_key, |_| ())
            .await
    }
}
