//! The object store trait and its S3-compatible implementation.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;

use crate::config::R2Config;

/// Errors from the object storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The put request was rejected or the connection failed.
    #[error("put object failed for key `{key}`: {reason}")]
    Put { key: String, reason: String },
}

/// Write-once put interface for durable artifact storage.
///
/// Idempotency is the backend's own contract: re-publishing under the
/// same key overwrites or duplicates depending on the store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Persist `bytes` under `key`.
    async fn put_object(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;
}

/// S3-compatible store targeting a custom endpoint (Cloudflare R2).
pub struct R2Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl R2Store {
    /// Build a store from R2 settings.
    ///
    /// Credentials are passed statically; the usual AWS provider chain is
    /// bypassed because R2 deployments configure keys directly.
    pub async fn connect(config: &R2Config) -> Self {
        let credentials = aws_credential_types::Credentials::from_keys(
            &config.access_key_id,
            &config.secret_access_key,
            None,
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint_url)
            .credentials_provider(credentials)
            .load()
            .await;

        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for R2Store {
    async fn put_object(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("text/csv")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| StorageError::Put {
                key: key.to_string(),
                reason: err.to_string(),
            })?;

        tracing::info!(key, bucket = %self.bucket, size, "Artifact published");
        Ok(())
    }
}
