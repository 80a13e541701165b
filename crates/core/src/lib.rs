//! Domain types for the reviewdock provisioner.
//!
//! A [`job::Job`] describes one unit of scraping work: a target URL, a
//! file-name prefix for the exported artifact, and the identifier the
//! artifact is published under. The [`naming`] module owns the path
//! conventions shared between the scraper container and the pipeline,
//! and [`target`] parses the work identifier out of the target URL.

pub mod job;
pub mod naming;
pub mod target;

pub use job::Job;
