//! Worker binary: runs one scrape job from environment configuration.
//!
//! Reads the target URL and storage settings from the environment, drives
//! the provisioning pipeline end to end, and exits non-zero if the job
//! fails. Ctrl-C cancels the job; the container is still removed before
//! the process exits.
//!
//! # Environment
//!
//! | Env Var             | Required | Default   |
//! |---------------------|----------|-----------|
//! | `HOTEL_URL`         | yes      | —         |
//! | `UPLOAD_IDENTIFIER` | yes      | —         |
//! | `FILE_PREFIX`       | no       | `reviews` |
//! | `JOB_DEADLINE_SECS` | no       | `1800`    |
//!
//! Plus the `DOCKER_*` and `R2_*` variables documented on
//! [`DockerConfig`] and [`R2Config`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reviewdock_cloud::{R2Config, R2Store};
use reviewdock_core::Job;
use reviewdock_docker::{DockerClient, DockerConfig};
use reviewdock_pipeline::{census, Pipeline, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "reviewdock_worker=debug,reviewdock_pipeline=debug,reviewdock_docker=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let backend = Arc::new(DockerClient::new(&DockerConfig::from_env()));
    let store = Arc::new(R2Store::connect(&R2Config::from_env()).await);
    let pipeline = Pipeline::new(
        Arc::clone(&backend),
        Arc::clone(&store),
        PipelineConfig::from_env(),
    );

    let target_url = std::env::var("HOTEL_URL").context("HOTEL_URL must be set")?;
    let upload_identifier =
        std::env::var("UPLOAD_IDENTIFIER").context("UPLOAD_IDENTIFIER must be set")?;
    let file_prefix = std::env::var("FILE_PREFIX").unwrap_or_else(|_| "reviews".into());
    let deadline_secs: u64 = std::env::var("JOB_DEADLINE_SECS")
        .unwrap_or_else(|_| "1800".into())
        .parse()
        .context("JOB_DEADLINE_SECS must be an integer number of seconds")?;

    let job = Job::from_target_url(&target_url, &file_prefix, &upload_identifier)
        .with_context(|| format!("invalid target URL `{target_url}`"))?;

    let running = census::count_running(backend.as_ref()).await?;
    tracing::info!(
        work_id = %job.work_id,
        running_containers = running,
        "Worker starting job",
    );

    let cancel = CancellationToken::new();
    let ctrlc_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling job");
            ctrlc_cancel.cancel();
        }
    });

    let report = pipeline
        .run(&job, Duration::from_secs(deadline_secs), &cancel)
        .await?;

    tracing::info!(
        container_id = %report.container_id,
        exit_code = report.exit_code,
        exported_path = %report.exported_path.display(),
        artifact_bytes = report.artifact_bytes,
        upload_identifier = %report.upload_identifier,
        "Job complete",
    );
    Ok(())
}
