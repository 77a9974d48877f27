//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use trache_shared::constants::{DEFAULT_HTTP_PORT, MAX_UPLOAD_SIZE};

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// JSON file holding the site content.
    /// Env: `DATA_FILE`
    /// Default: `data.json`
    pub data_file: PathBuf,

    /// CSV log of contact messages.
    /// Env: `MESSAGES_FILE`
    /// Default: `messages.csv`
    pub messages_file: PathBuf,

    /// Local upload root, used when no bucket is configured.
    /// Env: `UPLOAD_FOLDER`
    /// Default: `static/uploads`
    pub upload_folder: PathBuf,

    /// Maximum request body size for uploads.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 16 MiB
    pub max_upload_size: usize,

    /// Remote object storage; `None` keeps everything on local disk.
    pub object_storage: Option<ObjectStorageConfig>,

    // -- Admin access --

    /// Env: `ADMIN_USERNAME`
    /// Default: `admin`
    pub admin_username: String,

    /// Werkzeug hash, `pbkdf2:sha256:<iterations>$<salt>$<hex>` or
    /// `scrypt:<N>:<r>:<p>$<salt>$<hex>`.
    /// Env: `ADMIN_PASSWORD_HASH`
    /// Default: none (a development hash is generated at startup).
    pub admin_password_hash: Option<String>,

    /// Static bearer token accepted on admin routes, for scripts.
    /// Env: `ADMIN_TOKEN`
    /// Default: none.
    pub admin_token: Option<String>,

    /// File receiving login and logout audit events, in addition to stdout.
    /// Env: `ADMIN_LOG_PATH`
    /// Default: `admin_access.log`
    pub admin_log_path: PathBuf,

    /// Reverse proxies in front of the server that append to
    /// `X-Forwarded-For`. `0` keys the login limiter on the socket peer.
    /// Env: `TRUSTED_PROXY_HOPS`
    /// Default: `0`
    pub trusted_proxy_hops: usize,

    /// Redirect plain-HTTP requests to HTTPS (behind a proxy).
    /// Env: `FORCE_HTTPS` (`1` to enable)
    /// Default: `false`
    pub force_https: bool,
}

/// S3-compatible bucket settings. Credentials are not part of it: the AWS
/// SDK resolves them (`AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`, profile,
/// instance role).
#[derive(Debug, Clone)]
pub struct ObjectStorageConfig {
    /// Env: `S3_BUCKET`
    pub bucket: String,
    /// Env: `S3_REGION`, default `us-east-1`
    pub region: String,
    /// Public URL prefix for uploaded objects (CDN, custom domain).
    /// Env: `S3_PUBLIC_BASE`
    pub public_base: Option<String>,
    /// Key prefix for uploads. Env: `S3_PREFIX`, default `uploads/`
    pub prefix: String,
    /// Key prefix for data-file backups. Env: `S3_BACKUP_PREFIX`, default `backups/`
    pub backup_prefix: String,
    /// Custom endpoint for S3-compatible providers (path-style addressing).
    /// Env: `S3_ENDPOINT`
    pub endpoint: Option<String>,
    /// Bound on every request to the bucket, retries included.
    /// Env: `S3_TIMEOUT_SECS`, default 15
    pub timeout: Duration,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("data_file", &self.data_file)
            .field("messages_file", &self.messages_file)
            .field("upload_folder", &self.upload_folder)
            .field("max_upload_size", &self.max_upload_size)
            .field("object_storage", &self.object_storage)
            .field("admin_username", &self.admin_username)
            .field("admin_password_hash", &self.admin_password_hash.is_some())
            .field("admin_token", &self.admin_token.is_some())
            .field("admin_log_path", &self.admin_log_path)
            .field("trusted_proxy_hops", &self.trusted_proxy_hops)
            .field("force_https", &self.force_https)
            .finish()
    }
}

impl ObjectStorageConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: "us-east-1".to_string(),
            public_base: None,
            prefix: "uploads/".to_string(),
            backup_prefix: "backups/".to_string(),
            endpoint: None,
            timeout: Duration::from_secs(15),
        }
    }

    fn from_env(bucket: String) -> Self {
        let mut config = Self::new(bucket);

        if let Some(region) = non_empty_var("S3_REGION") {
            config.region = region;
        }
        config.public_base = non_empty_var("S3_PUBLIC_BASE");
        if let Ok(prefix) = std::env::var("S3_PREFIX") {
            config.prefix = prefix;
        }
        if let Ok(prefix) = std::env::var("S3_BACKUP_PREFIX") {
            config.backup_prefix = prefix;
        }
        config.endpoint = non_empty_var("S3_ENDPOINT");

        if let Ok(val) = std::env::var("S3_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid S3_TIMEOUT_SECS, using default"),
            }
        }

        config
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            data_file: PathBuf::from("data.json"),
            messages_file: PathBuf::from("messages.csv"),
            upload_folder: PathBuf::from("static/uploads"),
            max_upload_size: MAX_UPLOAD_SIZE,
            object_storage: None,
            admin_username: "admin".to_string(),
            admin_password_hash: None,
            admin_token: None,
            admin_log_path: PathBuf::from("admin_access.log"),
            trusted_proxy_hops: 0,
            force_https: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Some(path) = non_empty_var("DATA_FILE") {
            config.data_file = PathBuf::from(path);
        }

        if let Some(path) = non_empty_var("MESSAGES_FILE") {
            config.messages_file = PathBuf::from(path);
        }

        if let Some(path) = non_empty_var("UPLOAD_FOLDER") {
            config.upload_folder = PathBuf::from(path);
        }

        if let Ok(val) = std::env::var("MAX_UPLOAD_SIZE") {
            match val.parse::<usize>() {
                Ok(n) => config.max_upload_size = n,
                Err(_) => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default"),
            }
        }

        config.object_storage = non_empty_var("S3_BUCKET").map(ObjectStorageConfig::from_env);

        // -- Admin access --

        if let Some(username) = non_empty_var("ADMIN_USERNAME") {
            config.admin_username = username;
        }

        config.admin_password_hash = non_empty_var("ADMIN_PASSWORD_HASH");
        config.admin_token = non_empty_var("ADMIN_TOKEN");

        config.admin_log_path = Self::admin_log_path_from_env();

        if let Ok(val) = std::env::var("TRUSTED_PROXY_HOPS") {
            match val.parse::<usize>() {
                Ok(n) => config.trusted_proxy_hops = n,
                Err(_) => tracing::warn!(value = %val, "Invalid TRUSTED_PROXY_HOPS, using default"),
            }
        }

        if let Ok(val) = std::env::var("FORCE_HTTPS") {
            config.force_https = val == "1";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// `ADMIN_LOG_PATH` alone, for wiring the audit log before the rest of
    /// the configuration is read.
    pub fn admin_log_path_from_env() -> PathBuf {
        non_empty_var("ADMIN_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("admin_access.log"))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 5000).into());
        assert_eq!(config.data_file, PathBuf::from("data.json"));
        assert_eq!(config.upload_folder, PathBuf::from("static/uploads"));
        assert!(config.object_storage.is_none());
        assert!(!config.force_https);
    }

    #[test]
    fn test_object_storage_defaults() {
        let storage = ObjectStorageConfig::new("bucket");
        assert_eq!(storage.region, "us-east-1");
        assert_eq!(storage.prefix, "uploads/");
        assert_eq!(storage.backup_prefix, "backups/");
        assert_eq!(storage.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_debug_hides_admin_secrets() {
        let config = ServerConfig {
            admin_password_hash: Some("pbkdf2:sha256:1$salt$abcdef".into()),
            admin_token: Some("very-secret".into()),
            ..ServerConfig::default()
        };
        let shown = format!("{config:?}");
        assert!(!shown.contains("very-secret"));
        assert!(!shown.contains("abcdef"));
    }
}
