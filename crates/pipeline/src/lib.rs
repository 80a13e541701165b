//! The per-job provisioning pipeline.
//!
//! One call to [`Pipeline::run`] drives a single job end to end: create
//! a scraper container, start it, wait for it to exit, pull the CSV
//! artifact out of its filesystem, publish the artifact to object
//! storage, and remove the container. Removal is unconditional once the
//! container exists — every exit path issues exactly one remove call
//! before control returns to the caller.
//!
//! [`census::count_running`] is the independent read-only query external
//! admission control throttles on.

pub mod census;
pub mod error;
pub mod pipeline;

pub use error::PipelineError;
pub use pipeline::{JobReport, Pipeline, PipelineConfig, DEFAULT_SCRAPER_IMAGE};
