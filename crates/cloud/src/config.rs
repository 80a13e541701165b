//! Object storage settings resolved from the environment.

/// Connection settings for an S3-compatible bucket.
///
/// Credentials and endpoint come from the environment; there are no
/// defaults for them, since a missing value can only produce confusing
/// upload failures later.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// Endpoint URL, e.g. `https://<account>.r2.cloudflarestorage.com`.
    pub endpoint_url: String,
    /// Target bucket name.
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Region name; R2 uses the literal `auto`.
    pub region: String,
}

impl R2Config {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default |
    /// |------------------------|---------|
    /// | `R2_ENDPOINT`          | — (required) |
    /// | `R2_BUCKET`            | — (required) |
    /// | `R2_ACCESS_KEY_ID`     | — (required) |
    /// | `R2_SECRET_ACCESS_KEY` | — (required) |
    /// | `R2_REGION`            | `auto`  |
    pub fn from_env() -> Self {
        let endpoint_url = std::env::var("R2_ENDPOINT").expect("R2_ENDPOINT must be set");
        let bucket = std::env::var("R2_BUCKET").expect("R2_BUCKET must be set");
        let access_key_id =
            std::env::var("R2_ACCESS_KEY_ID").expect("R2_ACCESS_KEY_ID must be set");
        let secret_access_key =
            std::env::var("R2_SECRET_ACCESS_KEY").expect("R2_SECRET_ACCESS_KEY must be set");
        let region = std::env::var("R2_REGION").unwrap_or_else(|_| "auto".into());

        Self {
            endpoint_url,
            bucket,
            access_key_id,
            secret_access_key,
            region,
        }
    }
}
