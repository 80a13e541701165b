//! Docker Engine HTTP API client for provisioning ephemeral containers.
//!
//! Provides the [`ContainerBackend`] trait the pipeline is driven
//! through, a [`DockerClient`] implementation over the Engine REST API,
//! connection configuration resolved from the environment, and a pull
//! parser for the tar archive transport used to copy files out of a
//! container filesystem.

pub mod archive;
pub mod backend;
pub mod client;
pub mod config;

pub use archive::ArchiveError;
pub use backend::{
    ArchiveStream, BackendError, ContainerBackend, ContainerId, ContainerSpec, ExitStatus,
    RemoveOptions,
};
pub use client::DockerClient;
pub use config::DockerConfig;
