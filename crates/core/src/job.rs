//! The unit of provisioning work.

use crate::target::{work_id_from_url, TargetUrlError};

/// A single unit of scraping work.
///
/// Immutable once constructed. A `Job` exists only for the duration of one
/// pipeline run and is never persisted; exactly one container, one
/// artifact, and one upload record derive from it.
#[derive(Debug, Clone)]
pub struct Job {
    /// Full target URL, injected into the container environment.
    pub target_url: String,
    /// Work identifier (hotel name) parsed from the URL; keys the
    /// artifact path and the container environment.
    pub work_id: String,
    /// Prefix for the exported local artifact filename.
    pub file_prefix: String,
    /// Key under which the artifact is persisted in object storage.
    pub upload_identifier: String,
}

impl Job {
    /// Build a job from a target URL, deriving the work identifier.
    ///
    /// Fails if the URL is not a parseable hotel review URL, so a bad
    /// submission is rejected before any container is created.
    pub fn from_target_url(
        target_url: &str,
        file_prefix: &str,
        upload_identifier: &str,
    ) -> Result<Self, TargetUrlError> {
        let work_id = work_id_from_url(target_url)?;
        Ok(Self {
            target_url: target_url.to_string(),
            work_id,
            file_prefix: file_prefix.to_string(),
            upload_identifier: upload_identifier.to_string(),
        })
    }

    /// Build a job with an explicit work identifier, bypassing URL parsing.
    pub fn with_work_id(
        target_url: &str,
        work_id: &str,
        file_prefix: &str,
        upload_identifier: &str,
    ) -> Self {
        Self {
            target_url: target_url.to_string(),
            work_id: work_id.to_string(),
            file_prefix: file_prefix.to_string(),
            upload_identifier: upload_identifier.to_string(),
        }
    }
}
