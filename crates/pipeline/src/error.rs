//! Job-level failure taxonomy.

use std::time::Duration;

use reviewdock_cloud::StorageError;
use reviewdock_docker::{ArchiveError, BackendError};

/// Everything that can end a job early.
///
/// Propagation is fail-fast: the first error aborts the remaining stages
/// and is surfaced to the caller unchanged; nothing is retried inside the
/// pipeline. Container removal still happens under every variant.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The daemon connection was lost. Fatal to the job.
    #[error("container backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Container identity collision (already created or already running).
    #[error("container conflict: {0}")]
    UnitConflict(String),

    /// The backend reported a failure while awaiting completion. The
    /// container may not have reached a clean terminal state.
    #[error("error while waiting for container exit: {0}")]
    Wait(String),

    /// The container exited without producing the expected artifact.
    #[error("artifact not found in container at `{path}`")]
    ArtifactNotFound { path: String },

    /// The archive transport was corrupted or truncated mid-extraction.
    #[error("artifact archive stream failed: {0}")]
    StreamRead(String),

    /// Writing the artifact to local scratch storage failed.
    #[error("failed to write local artifact `{path}`: {source}")]
    LocalWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The durable-storage put failed. The artifact still exists locally.
    #[error("publish failed: {0}")]
    Publish(#[source] StorageError),

    /// The whole-job deadline elapsed.
    #[error("job deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// The job's cancellation token fired.
    #[error("job cancelled")]
    Cancelled,

    /// Removal failed after an otherwise successful run, leaking the
    /// container on the daemon.
    #[error("failed to remove container `{id}`: {reason}")]
    RemoveFailed { id: String, reason: String },

    /// Any other Engine API failure.
    #[error("container backend error: {0}")]
    Backend(String),
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(message) => Self::BackendUnavailable(message),
            BackendError::Conflict(message) => Self::UnitConflict(message),
            BackendError::Wait(message) => Self::Wait(message),
            BackendError::PathNotFound(path) => Self::ArtifactNotFound { path },
            BackendError::Api { status, body } => Self::Backend(format!("status {status}: {body}")),
        }
    }
}

impl From<ArchiveError> for PipelineError {
    fn from(err: ArchiveError) -> Self {
        Self::StreamRead(err.to_string())
    }
}
