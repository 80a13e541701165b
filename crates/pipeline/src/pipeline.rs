//! The per-job driver: create → start → wait → extract → publish →
//! remove.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use reviewdock_cloud::ObjectStore;
use reviewdock_core::{naming, Job};
use reviewdock_docker::{
    archive, ContainerBackend, ContainerId, ContainerSpec, RemoveOptions,
};

use crate::error::PipelineError;

/// Default image reference for scraper containers.
pub const DEFAULT_SCRAPER_IMAGE: &str =
    "ghcr.io/algo7/tripadvisor-review-scraper/scrap:latest";

/// Tunables shared by every job a [`Pipeline`] runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Image reference for scraper containers.
    pub image: String,
    /// Directory that receives extracted artifacts.
    pub export_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_SCRAPER_IMAGE.into(),
            export_dir: std::env::temp_dir(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var         | Default                      |
    /// |-----------------|------------------------------|
    /// | `SCRAPER_IMAGE` | the pinned scraper image     |
    /// | `EXPORT_DIR`    | the system temp directory    |
    pub fn from_env() -> Self {
        let image =
            std::env::var("SCRAPER_IMAGE").unwrap_or_else(|_| DEFAULT_SCRAPER_IMAGE.into());
        let export_dir = std::env::var("EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());

        Self { image, export_dir }
    }
}

/// What a successfully published job produced.
#[derive(Debug)]
pub struct JobReport {
    /// Identity of the (now removed) container that ran the job.
    pub container_id: ContainerId,
    /// Exit code of the scraper process.
    pub exit_code: i64,
    /// Local path the artifact was materialized under.
    pub exported_path: PathBuf,
    /// Artifact size in bytes.
    pub artifact_bytes: u64,
    /// Object-storage key the artifact was published under.
    pub upload_identifier: String,
}

/// Drives jobs against a container backend and an object store.
///
/// Stateless across jobs: each [`run`](Self::run) call owns its container
/// exclusively, so any number of jobs may run concurrently on clones of
/// the same pipeline. No lock is held across a blocking point.
pub struct Pipeline<B, S> {
    backend: Arc<B>,
    store: Arc<S>,
    config: PipelineConfig,
}

impl<B, S> Pipeline<B, S>
where
    B: ContainerBackend,
    S: ObjectStore,
{
    pub fn new(backend: Arc<B>, store: Arc<S>, config: PipelineConfig) -> Self {
        Self {
            backend,
            store,
            config,
        }
    }

    /// Run one job end to end.
    ///
    /// `deadline` bounds everything after container creation; on expiry
    /// the job resolves to [`PipelineError::DeadlineExceeded`]. `cancel`
    /// aborts the job at the same boundaries. In both cases — and under
    /// every other error — the container is still removed exactly once
    /// before this function returns.
    pub async fn run(
        &self,
        job: &Job,
        deadline: Duration,
        cancel: &CancellationToken,
    ) -> Result<JobReport, PipelineError> {
        let spec = scraper_spec(&self.config.image, job);
        let container_id = self.backend.create_container(&spec).await?;
        tracing::info!(
            container_id = %container_id,
            work_id = %job.work_id,
            "Container created",
        );

        // The container exists from here on; exactly one remove call runs
        // below no matter how the stages resolve.
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            _ = tokio::time::sleep(deadline) => Err(PipelineError::DeadlineExceeded(deadline)),
            outcome = self.drive(&container_id, job) => outcome,
        };

        let removal = self
            .backend
            .remove_container(&container_id, RemoveOptions::forced())
            .await;

        match (result, removal) {
            (Ok(report), Ok(())) => {
                tracing::info!(
                    container_id = %container_id,
                    upload_identifier = %report.upload_identifier,
                    "Job complete, container removed",
                );
                Ok(report)
            }
            (Ok(_), Err(remove_err)) => Err(PipelineError::RemoveFailed {
                id: container_id.to_string(),
                reason: remove_err.to_string(),
            }),
            (Err(job_err), Ok(())) => Err(job_err),
            (Err(job_err), Err(remove_err)) => {
                // The job error is the one the caller needs; the leak is
                // only logged.
                tracing::error!(
                    container_id = %container_id,
                    error = %remove_err,
                    "Container removal failed after job error",
                );
                Err(job_err)
            }
        }
    }

    /// The post-create stages, in order: start, wait, extract, publish.
    ///
    /// Extraction never begins before the completion signal; the caller
    /// never removes before this resolves.
    async fn drive(&self, id: &ContainerId, job: &Job) -> Result<JobReport, PipelineError> {
        self.backend.start_container(id).await?;
        tracing::info!(container_id = %id, "Container started");

        let status = self.backend.wait_container(id).await?;
        tracing::info!(
            container_id = %id,
            exit_code = status.code,
            "Container exited",
        );

        let path = naming::artifact_path_in_container(&job.work_id);
        let stream = self.backend.copy_from_container(id, &path).await?;

        let entry_name = naming::artifact_entry_name(&job.work_id);
        let data = archive::extract_file(stream, &entry_name)
            .await?
            .ok_or_else(|| {
                PipelineError::StreamRead(format!("archive held no entry named `{entry_name}`"))
            })?;

        let exported_path = self
            .config
            .export_dir
            .join(naming::exported_filename(&job.file_prefix, &job.work_id));
        tokio::fs::write(&exported_path, &data)
            .await
            .map_err(|source| PipelineError::LocalWrite {
                path: exported_path.display().to_string(),
                source,
            })?;
        tracing::info!(
            path = %exported_path.display(),
            bytes = data.len(),
            "Artifact exported",
        );

        // The publisher reads the materialized file, not the in-memory
        // copy, so what lands in storage is exactly what is on disk.
        let payload = tokio::fs::read(&exported_path)
            .await
            .map_err(|source| PipelineError::LocalWrite {
                path: exported_path.display().to_string(),
                source,
            })?;
        let artifact_bytes = payload.len() as u64;
        self.store
            .put_object(&job.upload_identifier, payload)
            .await
            .map_err(PipelineError::Publish)?;

        Ok(JobReport {
            container_id: id.clone(),
            exit_code: status.code,
            exported_path,
            artifact_bytes,
            upload_identifier: job.upload_identifier.clone(),
        })
    }
}

/// Container spec for a scraper run against `job`'s target.
///
/// The env set is the scraper image's contract; variable names must not
/// change independently of the image.
fn scraper_spec(image: &str, job: &Job) -> ContainerSpec {
    ContainerSpec {
        image: image.to_string(),
        env: vec![
            "CONCURRENCY=1".into(),
            "SCRAPE_MODE=HOTEL".into(),
            format!("HOTEL_NAME={}", job.work_id),
            "IS_PROVISIONER=true".into(),
            format!("HOTEL_URL={}", job.target_url),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scraper_spec_carries_the_env_contract() {
        let job = Job::with_work_id(
            "https://example.test/Hotel_Review-g1-d2-Reviews-X-Y.html",
            "Grand_Palace",
            "reviews",
            "upload-1",
        );
        let spec = scraper_spec(DEFAULT_SCRAPER_IMAGE, &job);

        assert!(spec.env.contains(&"CONCURRENCY=1".to_string()));
        assert!(spec.env.contains(&"SCRAPE_MODE=HOTEL".to_string()));
        assert!(spec.env.contains(&"IS_PROVISIONER=true".to_string()));
        assert!(spec
            .env
            .contains(&"HOTEL_NAME=Grand_Palace".to_string()));
        assert!(spec.env.iter().any(|e| e.starts_with("HOTEL_URL=")));
    }
}
