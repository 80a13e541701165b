//! The container backend abstraction the pipeline is driven through.
//!
//! [`DockerClient`](crate::client::DockerClient) is the production
//! implementation; tests drive the pipeline with an in-memory double.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Opaque backend-assigned container identity.
///
/// Exclusively owned by the pipeline invocation that created it; never
/// shared or reused across jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(pub String);

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declarative configuration for a container to be created.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    /// Image reference, e.g. `ghcr.io/…/scrap:latest`.
    pub image: String,
    /// Flat `KEY=value` environment entries injected into the container.
    pub env: Vec<String>,
}

/// Options for container removal.
#[derive(Debug, Clone, Copy)]
pub struct RemoveOptions {
    pub force: bool,
    pub remove_volumes: bool,
}

impl RemoveOptions {
    /// Forced removal including anonymous volumes — the teardown mode the
    /// pipeline uses on every exit path.
    pub fn forced() -> Self {
        Self {
            force: true,
            remove_volumes: true,
        }
    }
}

/// Terminal status reported by the backend once a container stops.
#[derive(Debug, Clone, Copy)]
pub struct ExitStatus {
    /// Process exit code of the container's entrypoint.
    pub code: i64,
}

/// Streamed archive bytes from a `copy_from_container` call.
pub type ArchiveStream = BoxStream<'static, Result<Bytes, BackendError>>;

/// Errors from the container backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The daemon could not be reached or the connection dropped.
    #[error("container backend unavailable: {0}")]
    Unavailable(String),

    /// The container identity is already in use or already running.
    #[error("container conflict: {0}")]
    Conflict(String),

    /// The requested path does not exist inside the container.
    #[error("path not found in container: {0}")]
    PathNotFound(String),

    /// The backend reported an error while waiting for the container.
    #[error("wait failed: {0}")]
    Wait(String),

    /// Any other non-success response from the Engine API.
    #[error("engine API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Container-style execution backend: create, start, wait, copy-out,
/// remove, plus the read-only running-container census.
///
/// All operations are potentially long-running; implementations must not
/// hold locks across them.
#[async_trait]
pub trait ContainerBackend: Send + Sync {
    /// Declare a new container. The container is created stopped and must
    /// never auto-remove on exit — removal is explicit, after extraction.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, BackendError>;

    /// Start a created container.
    async fn start_container(&self, id: &ContainerId) -> Result<(), BackendError>;

    /// Block until the container leaves the running state.
    async fn wait_container(&self, id: &ContainerId) -> Result<ExitStatus, BackendError>;

    /// Request `path` from the container filesystem as a streamed tar
    /// archive.
    async fn copy_from_container(
        &self,
        id: &ContainerId,
        path: &str,
    ) -> Result<ArchiveStream, BackendError>;

    /// Remove the container. Valid in any lifecycle state when
    /// [`RemoveOptions::forced`] is used.
    async fn remove_container(
        &self,
        id: &ContainerId,
        options: RemoveOptions,
    ) -> Result<(), BackendError>;

    /// Number of containers currently running on the daemon. Side-effect
    /// free; excludes stopped and exited containers.
    async fn count_running(&self) -> Result<usize, BackendError>;
}
