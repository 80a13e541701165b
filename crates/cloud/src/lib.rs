//! Durable object storage for extracted artifacts.
//!
//! The [`ObjectStore`] trait is the write-once put seam the pipeline
//! publishes through; [`R2Store`] is the production implementation
//! backed by `aws-sdk-s3` against an S3-compatible endpoint (Cloudflare
//! R2 in the original deployment).

pub mod config;
pub mod store;

pub use config::R2Config;
pub use store::{ObjectStore, R2Store, StorageError};
