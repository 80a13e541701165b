//! Read-only census of running containers.

use reviewdock_docker::ContainerBackend;

use crate::error::PipelineError;

/// Number of containers currently running on the backend.
///
/// Side-effect-free and uncached: every call reflects the daemon's own
/// running set at call time. External admission control uses this as its
/// signal for bounding concurrent job submissions; the bounding policy
/// itself lives with the caller.
pub async fn count_running<B: ContainerBackend>(backend: &B) -> Result<usize, PipelineError> {
    Ok(backend.count_running().await?)
}
