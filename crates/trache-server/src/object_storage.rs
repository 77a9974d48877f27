//! S3-compatible object storage.
//!
//! Only `PutObject` is needed: uploads and data-file backups are written,
//! never read back through the API (objects are served from their public
//! URL).

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ObjectStorageConfig;

#[derive(Debug, Error)]
pub enum ObjectStorageError {
    #[error("Object storage rejected '{key}': {message}")]
    Rejected { key: String, message: String },

    #[error("Object storage misconfigured: {0}")]
    Config(String),
}

/// Write-only view of a bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), ObjectStorageError>;
}

// ---------------------------------------------------------------------------
// Remote storage handle
// ---------------------------------------------------------------------------

/// A configured bucket plus the key and URL conventions around it.
#[derive(Clone)]
pub struct RemoteStorage {
    pub store: Arc<dyn ObjectStore>,
    prefix: String,
    backup_prefix: String,
    public_base: String,
}

impl RemoteStorage {
    pub fn new(store: Arc<dyn ObjectStore>, config: &ObjectStorageConfig) -> Self {
        Self {
            store,
            prefix: config.prefix.clone(),
            backup_prefix: config.backup_prefix.clone(),
            public_base: public_base_url(config),
        }
    }

    /// Build the S3 client for `config`. A bad endpoint disables remote
    /// storage with a warning instead of stopping the server.
    pub async fn connect(config: &ObjectStorageConfig) -> Option<Self> {
        match S3Store::connect(config).await {
            Ok(client) => {
                info!(
                    bucket = %config.bucket,
                    region = %config.region,
                    endpoint = ?config.endpoint,
                    "Object storage enabled"
                );
                Some(Self::new(Arc::new(client), config))
            }
            Err(e) => {
                warn!(
                    bucket = %config.bucket,
                    error = %e,
                    "Object storage disabled, falling back to local uploads"
                );
                None
            }
        }
    }

    /// `<prefix>/<subdir>/<filename>`, skipping empty parts.
    pub fn upload_key(&self, subdir: &str, filename: &str) -> String {
        [self.prefix.trim_matches('/'), subdir.trim_matches('/'), filename]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// `<backup_prefix>/<name>`, without stray slashes.
    pub fn backup_key(&self, name: &str) -> String {
        format!("{}/{}", self.backup_prefix.trim_matches('/'), name)
            .trim_matches('/')
            .to_string()
    }

    /// Absolute URL an uploaded object is served from.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

/// `S3_PUBLIC_BASE` if set, else the bucket's default AWS host.
pub fn public_base_url(config: &ObjectStorageConfig) -> String {
    if let Some(base) = &config.public_base {
        return base.trim_end_matches('/').to_string();
    }
    if config.region == "us-east-1" {
        format!("https://{}.s3.amazonaws.com", config.bucket)
    } else {
        format!("https://{}.s3.{}.amazonaws.com", config.bucket, config.region)
    }
}

// ---------------------------------------------------------------------------
// S3 client
// ---------------------------------------------------------------------------

/// Bucket reached through the AWS SDK.
///
/// Credentials come from the SDK's default chain (environment, shared
/// profile, container or instance role). With a custom endpoint (MinIO,
/// R2, Scaleway...) requests use path-style `<endpoint>/<bucket>/<key>`.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    pub async fn connect(config: &ObjectStorageConfig) -> Result<Self, ObjectStorageError> {
        if let Some(endpoint) = &config.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ObjectStorageError::Config(format!(
                    "S3_ENDPOINT must be an http(s) URL, got '{endpoint}'"
                )));
            }
        }

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(config.timeout)
                    .build(),
            )
            .load()
            .await;

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(sdk_config(&shared, config)),
            bucket: config.bucket.clone(),
        })
    }
}

fn sdk_config(
    shared: &aws_config::SdkConfig,
    config: &ObjectStorageConfig,
) -> aws_sdk_s3::Config {
    let mut builder = aws_sdk_s3::config::Builder::from(shared);
    if let Some(endpoint) = &config.endpoint {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    builder.build()
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), ObjectStorageError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| ObjectStorageError::Rejected {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(key, size, "Stored object");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn remote(config: &ObjectStorageConfig) -> RemoteStorage {
        RemoteStorage::new(Arc::new(testing::MemoryStore::default()), config)
    }

    #[test]
    fn test_public_base_defaults() {
        let mut config = ObjectStorageConfig::new("trache");
        assert_eq!(public_base_url(&config), "https://trache.s3.amazonaws.com");

        config.region = "eu-west-3".into();
        assert_eq!(
            public_base_url(&config),
            "https://trache.s3.eu-west-3.amazonaws.com"
        );

        config.public_base = Some("https://cdn.example.com/".into());
        assert_eq!(public_base_url(&config), "https://cdn.example.com");
    }

    #[test]
    fn test_upload_key() {
        let mut config = ObjectStorageConfig::new("trache");
        let storage = remote(&config);
        assert_eq!(
            storage.upload_key("destinations", "paris.png"),
            "uploads/destinations/paris.png"
        );
        assert_eq!(storage.upload_key("", "logo.jpg"), "uploads/logo.jpg");
        assert_eq!(storage.upload_key("/destinations/", "a.png"), "uploads/destinations/a.png");

        config.prefix = String::new();
        assert_eq!(remote(&config).upload_key("", "logo.jpg"), "logo.jpg");
    }

    #[test]
    fn test_backup_key() {
        let mut config = ObjectStorageConfig::new("trache");
        assert_eq!(remote(&config).backup_key("data.json"), "backups/data.json");

        config.backup_prefix = "/site/backups/".into();
        assert_eq!(
            remote(&config).backup_key("messages.csv"),
            "site/backups/messages.csv"
        );

        config.backup_prefix = String::new();
        assert_eq!(remote(&config).backup_key("data.json"), "data.json");
    }

    #[test]
    fn test_public_url() {
        let storage = remote(&ObjectStorageConfig::new("trache"));
        assert_eq!(
            storage.public_url("uploads/logo.jpg"),
            "https://trache.s3.amazonaws.com/uploads/logo.jpg"
        );
    }

    #[tokio::test]
    async fn test_connect_without_static_credentials() {
        let mut config = ObjectStorageConfig::new("trache");
        config.region = "eu-west-3".into();
        assert!(RemoteStorage::connect(&config).await.is_some());
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_endpoint() {
        let mut config = ObjectStorageConfig::new("trache");
        config.endpoint = Some("localhost:9000".into());
        assert!(matches!(
            S3Store::connect(&config).await,
            Err(ObjectStorageError::Config(_))
        ));
        assert!(RemoteStorage::connect(&config).await.is_none());
    }

    #[test]
    fn test_sdk_config_keeps_region() {
        let mut config = ObjectStorageConfig::new("trache");
        config.region = "fr-par".into();
        config.endpoint = Some("http://localhost:9000".into());
        config.timeout = Duration::from_secs(3);

        let shared = aws_config::SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .build();
        let sdk = sdk_config(&shared, &config);
        assert_eq!(sdk.region().map(|r| r.as_ref()), Some("fr-par"));
    }

    #[tokio::test]
    async fn test_connect_with_custom_endpoint() {
        let mut config = ObjectStorageConfig::new("trache");
        config.endpoint = Some("http://localhost:9000".into());
        let storage = RemoteStorage::connect(&config).await.unwrap();
        assert_eq!(storage.backup_key("data.json"), "backups/data.json");
    }
}
