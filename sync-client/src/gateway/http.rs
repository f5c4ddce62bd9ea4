//! REST gateway over reqwest.

use super::{BackendGateway, GatewayError};
use crate::config::GatewayConfig;
use crate::storage::{KeyValueStore, AUTH_TOKEN_KEY};
use async_trait::async_trait;
use cleanout_sync_types::{
    Customer, CustomerChanges, Job, JobChanges, NewCustomer, NewJob, NewRoom, OperationId,
    Room, RoomOverride,
};
use reqwest::{multipart, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Header carrying the operation id on replay requests.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

const CUSTOMERS: &str = "/api/customers";
const JOBS: &str = "/api/jobs";
const ROOMS: &str = "/api/rooms";

const DEFAULT_IMAGE_NAME: &str = "photo.jpg";
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Gateway to the Cleanout REST backend.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
    tokens: Option<Arc<dyn KeyValueStore>>,
}

impl HttpGateway {
    /// Build a gateway. Fails only if the HTTP client cannot be constructed.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            tokens: None,
        })
    }

    /// Attach `Authorization: Bearer` from [`AUTH_TOKEN_KEY`] in `store`.
    ///
    /// The token is read on every request so a login takes effect without
    /// rebuilding the gateway.
    pub fn with_token_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.tokens = Some(store);
        self
    }

    /// The gateway's configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// URL for a fixed API path such as `/api/jobs`.
    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        Url::parse(&self.config.url(path))
            .map_err(|e| GatewayError::Http(format!("invalid backend url: {}", e)))
    }

    /// URL for one entity in a collection. The id becomes a single
    /// percent-encoded path segment.
    fn entity_endpoint(&self, collection: &str, id: &str) -> Result<Url, GatewayError> {
        if id.is_empty() || id == "." || id == ".." {
            return Err(GatewayError::Http(format!("invalid entity id {:?}", id)));
        }
        let mut url = self.endpoint(collection)?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::Http("backend url cannot carry a path".into()))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    async fn request(
        &self,
        method: Method,
        url: Url,
        idempotency_key: Option<&OperationId>,
    ) -> RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(key) = idempotency_key {
            req = req.header(IDEMPOTENCY_HEADER, key.as_str());
        }
        match self.token().await {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn token(&self) -> Option<String> {
        let store = self.tokens.as_ref()?;
        match store.get(AUTH_TOKEN_KEY).await {
            Ok(Some(token)) if !token.trim().is_empty() => Some(token.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read auth token, sending unauthenticated");
                None
            }
        }
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        url: Url,
        body: &B,
        idempotency_key: &OperationId,
    ) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .request(method, url, Some(idempotency_key))
            .await
            .json(body)
            .send()
            .await?;
        read_record(check_status(response).await?).await
    }

    async fn send_delete(&self, url: Url, idempotency_key: &OperationId) -> Result<(), GatewayError> {
        let response = self
            .request(Method::DELETE, url, Some(idempotency_key))
            .await
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("config", &self.config)
            .field("authenticated", &self.tokens.is_some())
            .finish()
    }
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn health(&self) -> Result<(), GatewayError> {
        let response = self
            .request(Method::GET, self.endpoint("/health")?, None)
            .await
            .timeout(self.config.health_timeout)
            .send()
            .await?;
        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(GatewayError::Status {
                status: response.status().as_u16(),
                body: String::new(),
            })
        }
    }

    async fn create_customer(
        &self,
        customer: &NewCustomer,
        idempotency_key: &OperationId,
    ) -> Result<Customer, GatewayError> {
        let url = self.endpoint(CUSTOMERS)?;
        self.send_json(Method::POST, url, customer, idempotency_key)
            .await
    }

    async fn update_customer(
        &self,
        id: &str,
        changes: &CustomerChanges,
        idempotency_key: &OperationId,
    ) -> Result<Customer, GatewayError> {
        let url = self.entity_endpoint(CUSTOMERS, id)?;
        self.send_json(Method::PATCH, url, changes, idempotency_key)
            .await
    }

    async fn delete_customer(
        &self,
        id: &str,
        idempotency_key: &OperationId,
    ) -> Result<(), GatewayError> {
        self.send_delete(self.entity_endpoint(CUSTOMERS, id)?, idempotency_key)
            .await
    }

    async fn create_job(
        &self,
        job: &NewJob,
        idempotency_key: &OperationId,
    ) -> Result<Job, GatewayError> {
        let url = self.endpoint(JOBS)?;
        self.send_json(Method::POST, url, job, idempotency_key)
            .await
    }

    async fn update_job(
        &self,
        id: &str,
        changes: &JobChanges,
        idempotency_key: &OperationId,
    ) -> Result<Job, GatewayError> {
        let url = self.entity_endpoint(JOBS, id)?;
        self.send_json(Method::PATCH, url, changes, idempotency_key)
            .await
    }

    async fn delete_job(
        &self,
        id: &str,
        idempotency_key: &OperationId,
    ) -> Result<(), GatewayError> {
        self.send_delete(self.entity_endpoint(JOBS, id)?, idempotency_key)
            .await
    }

    async fn upload_room(
        &self,
        room: &NewRoom,
        idempotency_key: &OperationId,
    ) -> Result<Room, GatewayError> {
        let url = self.endpoint(ROOMS)?;
        let path = image_path(&room.image_uri);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| GatewayError::Image {
                path: path.clone(),
                source,
            })?;
        let file_name = image_file_name(&path);
        let mime = image_mime(&file_name);
        tracing::debug!(
            job_id = %room.job_id,
            file = %file_name,
            size = bytes.len(),
            "uploading room image"
        );

        let image = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&mime)?;
        let form = multipart::Form::new()
            .text("job_id", room.job_id.clone())
            .text("room_name", room.room_name.clone())
            .text("room_number", room.room_number.to_string())
            .part("image", image);

        let response = self
            .request(Method::POST, url, Some(idempotency_key))
            .await
            .timeout(self.config.upload_timeout)
            .multipart(form)
            .send()
            .await?;
        read_record(check_status(response).await?).await
    }

    async fn override_room(
        &self,
        id: &str,
        changes: &RoomOverride,
        idempotency_key: &OperationId,
    ) -> Result<Room, GatewayError> {
        let url = self.entity_endpoint(ROOMS, id)?;
        self.send_json(Method::PATCH, url, changes, idempotency_key)
            .await
    }

    async fn delete_room(
        &self,
        id: &str,
        idempotency_key: &OperationId,
    ) -> Result<(), GatewayError> {
        self.send_delete(self.entity_endpoint(ROOMS, id)?, idempotency_key)
            .await
    }
}

/// Map non-2xx responses to [`GatewayError::Status`].
async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Decode a 2xx body. Failures keep the status: the write already happened.
async fn read_record<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status().as_u16();
    let unreadable = |reason: String| GatewayError::Decode { status, reason };
    let body = response
        .bytes()
        .await
        .map_err(|e| unreadable(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| unreadable(e.to_string()))
}

/// Local path for an image reference, with any `file://` prefix removed.
fn image_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

fn image_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_IMAGE_NAME)
        .to_string()
}

fn image_mime(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            match ext.to_ascii_lowercase().as_str() {
                "jpg" | "jpeg" => DEFAULT_IMAGE_MIME.to_string(),
                ext => format!("image/{}", ext),
            }
        }
        _ => DEFAULT_IMAGE_MIME.to_string(),
    }
}
