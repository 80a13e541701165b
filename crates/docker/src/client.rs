//! REST client for the Docker Engine API.
//!
//! Wraps the Engine endpoints the provisioner needs (container create,
//! start, wait, archive copy-out, remove, list) using [`reqwest`]. One
//! client per concurrent job; the underlying connection pool is cheap to
//! build and handles are never shared mutably.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;

use crate::backend::{
    ArchiveStream, BackendError, ContainerBackend, ContainerId, ContainerSpec, ExitStatus,
    RemoveOptions,
};
use crate::config::DockerConfig;

/// HTTP client for a single Docker daemon.
pub struct DockerClient {
    client: reqwest::Client,
    base_url: String,
}

/// Response from `POST /containers/create`.
#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(rename = "Id")]
    id: String,
}

/// Response from `POST /containers/{id}/wait`.
#[derive(Debug, Deserialize)]
struct WaitResponse {
    #[serde(rename = "StatusCode")]
    status_code: i64,
    #[serde(rename = "Error")]
    error: Option<WaitErrorBody>,
}

#[derive(Debug, Deserialize)]
struct WaitErrorBody {
    #[serde(rename = "Message")]
    message: Option<String>,
}

/// One element of the `GET /containers/json` listing. Only the identity
/// is read; the census needs nothing else.
#[derive(Debug, Deserialize)]
struct ContainerSummary {
    #[serde(rename = "Id")]
    #[allow(dead_code)]
    id: String,
}

impl DockerClient {
    /// Create a client for the daemon described by `config`.
    pub fn new(config: &DockerConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`] (useful for
    /// connection pooling across the census and job pipelines).
    pub fn with_client(client: reqwest::Client, config: &DockerConfig) -> Self {
        let base_url = format!(
            "{}/{}",
            config.endpoint.trim_end_matches('/'),
            config.api_version,
        );
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ---- private helpers ----

    /// Map a transport-level failure to [`BackendError::Unavailable`].
    fn transport(err: reqwest::Error) -> BackendError {
        BackendError::Unavailable(err.to_string())
    }

    /// Ensure the response has a success status code, mapping the Engine
    /// API's conflict and not-found statuses to their own variants.
    async fn ensure_success(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        match status.as_u16() {
            // 304 = container already started, 409 = name/state conflict.
            304 | 409 => Err(BackendError::Conflict(format!("{context}: {body}"))),
            code => Err(BackendError::Api { status: code, body }),
        }
    }
}

#[async_trait]
impl ContainerBackend for DockerClient {
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, BackendError> {
        // AutoRemove must stay off: the artifact is copied out of the
        // container filesystem after exit, so the backend must not delete
        // it on its own.
        let body = serde_json::json!({
            "Image": spec.image,
            "Env": spec.env,
            "HostConfig": {
                "AutoRemove": false,
            },
        });

        let response = self
            .client
            .post(self.url("/containers/create"))
            .json(&body)
            .send()
            .await
            .map_err(Self::transport)?;

        let response = Self::ensure_success(response, "create container").await?;
        let created: CreateResponse = response.json().await.map_err(Self::transport)?;

        tracing::debug!(container_id = %created.id, image = %spec.image, "Container created");
        Ok(ContainerId(created.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url(&format!("/containers/{id}/start")))
            .send()
            .await
            .map_err(Self::transport)?;

        Self::ensure_success(response, "start container").await?;
        Ok(())
    }

    async fn wait_container(&self, id: &ContainerId) -> Result<ExitStatus, BackendError> {
        let response = self
            .client
            .post(self.url(&format!("/containers/{id}/wait?condition=not-running")))
            .send()
            .await
            .map_err(Self::transport)?;

        let response = Self::ensure_success(response, "wait for container").await?;
        let wait: WaitResponse = response.json().await.map_err(Self::transport)?;

        if let Some(message) = wait.error.and_then(|e| e.message).filter(|m| !m.is_empty()) {
            return Err(BackendError::Wait(message));
        }

        Ok(ExitStatus {
            code: wait.status_code,
        })
    }

    async fn copy_from_container(
        &self,
        id: &ContainerId,
        path: &str,
    ) -> Result<ArchiveStream, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("/containers/{id}/archive")))
            .query(&[("path", path)])
            .send()
            .await
            .map_err(Self::transport)?;

        // A 404 here means the container filesystem lacks the requested
        // path — distinct from transport failures and from a missing image
        // on create (also a 404, but on a different endpoint).
        if response.status().as_u16() == 404 {
            return Err(BackendError::PathNotFound(path.to_string()));
        }
        let response = Self::ensure_success(response, path).await?;

        // Failures past this point happen mid-archive and are surfaced by
        // the archive parser as transport errors, not as backend errors.
        Ok(response
            .bytes_stream()
            .map_err(Self::transport)
            .boxed())
    }

    async fn remove_container(
        &self,
        id: &ContainerId,
        options: RemoveOptions,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.url(&format!("/containers/{id}")))
            .query(&[
                ("force", options.force.to_string()),
                ("v", options.remove_volumes.to_string()),
            ])
            .send()
            .await
            .map_err(Self::transport)?;

        Self::ensure_success(response, "remove container").await?;
        tracing::debug!(container_id = %id, "Container removed");
        Ok(())
    }

    async fn count_running(&self) -> Result<usize, BackendError> {
        // The listing defaults to running containers only; stopped and
        // exited ones are excluded.
        let response = self
            .client
            .get(self.url("/containers/json"))
            .send()
            .await
            .map_err(Self::transport)?;

        let response = Self::ensure_success(response, "list containers").await?;
        let running: Vec<ContainerSummary> = response.json().await.map_err(Self::transport)?;
        Ok(running.len())
    }
}
