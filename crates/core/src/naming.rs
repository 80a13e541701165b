//! Artifact path and filename conventions.
//!
//! The scraper image writes its output to a single well-known path inside
//! the container; the pipeline does not discover paths dynamically. The
//! exported local filename is deterministic so repeated runs of the same
//! job land on the same file.

/// Directory inside the scraper container that receives review exports.
pub const ARTIFACT_DIR: &str = "/puppeteer/reviews";

/// Path inside the container where the CSV artifact for `work_id` appears.
///
/// # Examples
///
/// ```
/// use reviewdock_core::naming::artifact_path_in_container;
///
/// assert_eq!(
///     artifact_path_in_container("hotel-123"),
///     "/puppeteer/reviews/0_hotel-123.csv",
/// );
/// ```
pub fn artifact_path_in_container(work_id: &str) -> String {
    format!("{ARTIFACT_DIR}/0_{work_id}.csv")
}

/// Name of the tar entry the archive endpoint returns for the artifact.
///
/// The Engine API frames a single-file copy as a one-entry archive whose
/// entry is named after the file, without the directory part.
pub fn artifact_entry_name(work_id: &str) -> String {
    format!("0_{work_id}.csv")
}

/// Local filename the extracted artifact is materialized under.
pub fn exported_filename(file_prefix: &str, work_id: &str) -> String {
    format!("{file_prefix}_0_{work_id}.csv")
}
