//! HTTP client for the opsync REST endpoints.

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use opsync_core::{RunStatus, StoredTask, SyncResult};

use crate::error::ClientError;

/// Filters for the task listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct SyncEnvelope {
    results: SyncResult,
}

#[derive(Deserialize)]
struct FailureEnvelope {
    error: Option<String>,
    message: Option<String>,
}

/// HTTP client for the opsync server.
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Check if the server is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = self.url("/health");
        debug!(url = %url, "Checking health");

        let response = self.inner.get(&url).send().await?;
        Ok(response.status().is_success())
    }

    /// Run a sync pass and wait for its result.
    pub async fn trigger_sync(&self) -> Result<SyncResult, ClientError> {
        let envelope: SyncEnvelope = self.send(self.inner.post(self.url("/tasks/sync"))).await?;
        Ok(envelope.results)
    }

    /// Current run status.
    pub async fn sync_status(&self) -> Result<RunStatus, ClientError> {
        self.get_data("/tasks/sync/status").await
    }

    /// Upstream sync scope, as reported by the server.
    pub async fn sync_config(&self) -> Result<serde_json::Value, ClientError> {
        self.get_data("/tasks/sync/config").await
    }

    /// List stored tasks.
    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<StoredTask>, ClientError> {
        let request = self.inner.get(self.url("/tasks")).query(query);
        let envelope: DataEnvelope<Vec<StoredTask>> = self.send(request).await?;
        Ok(envelope.data)
    }

    /// Get a task by local id.
    pub async fn get_task(&self, id: i64) -> Result<StoredTask, ClientError> {
        self.get_data(&format!("/tasks/{id}")).await
    }

    /// Get a task by upstream key.
    pub async fn get_task_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<StoredTask, ClientError> {
        self.get_data(&format!("/tasks/external/{external_id}"))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let envelope: DataEnvelope<T> = self.send(self.inner.get(self.url(path))).await?;
        Ok(envelope.data)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        debug!(url = %response.url(), status = %response.status(), "Response received");
        parse_response(response).await
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<FailureEnvelope>(&body)
            .ok()
            .and_then(|f| f.error.or(f.message))
            .unwrap_or(body);
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| ClientError::Serialization(e.to_string()))
}
