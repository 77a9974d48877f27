//! # trache-server
//!
//! HTTP backend for the Trache Travel agency site.
//!
//! This binary provides:
//! - **Public JSON API** (axum) for the site content, destination search,
//!   service pages and the contact form
//! - **Admin API** behind a login, for editing every part of the content
//!   document and reading contact messages
//! - **Uploads** to local disk or an S3-compatible bucket, with the data
//!   files mirrored to the bucket after every write
//! - **Login rate limiting** and an admin access audit log

mod admin;
mod api;
mod auth;
mod backup;
mod config;
mod error;
mod forms;
mod object_storage;
mod rate_limit;
mod upload;

use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn, Level};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use trache_shared::constants::{APP_NAME, DESTINATIONS_SUBDIR};
use trache_store::{ContentStore, MessageLog};

use crate::api::{AppState, AUDIT_TARGET};
use crate::auth::AdminAuth;
use crate::backup::BackupMirror;
use crate::config::ServerConfig;
use crate::object_storage::RemoteStorage;
use crate::rate_limit::RateLimiter;
use crate::upload::UploadGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var), plus the audit file
    // -----------------------------------------------------------------------
    let audit_path = ServerConfig::admin_log_path_from_env();
    let (audit_layer, audit_error) = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&audit_path)
    {
        Ok(file) => {
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .with_filter(Targets::new().with_target(AUDIT_TARGET, Level::INFO));
            (Some(layer), None)
        }
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer().with_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,trache_server=debug")),
            ),
        )
        .with(audit_layer)
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));
    if let Some(e) = audit_error {
        warn!(path = %audit_path.display(), error = %e, "Admin audit log file unavailable");
    }

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize storage
    // -----------------------------------------------------------------------

    // Bucket client, shared by uploads and backups
    let remote = match &config.object_storage {
        Some(storage) => RemoteStorage::connect(storage).await,
        None => None,
    };

    let mirror = Arc::new(BackupMirror::new(remote.clone()));
    let content = ContentStore::new(config.data_file.clone(), mirror.clone());
    let messages = MessageLog::new(config.messages_file.clone(), mirror);

    // Fail fast on a document that does not parse
    let document = content
        .load()
        .with_context(|| format!("loading {}", config.data_file.display()))?;
    info!(
        destinations = document.destinations.len(),
        services = document.services.len(),
        "Content document loaded"
    );

    let destinations_dir = config.upload_folder.join(DESTINATIONS_SUBDIR);
    tokio::fs::create_dir_all(&destinations_dir)
        .await
        .with_context(|| format!("creating {}", destinations_dir.display()))?;
    let uploads = Arc::new(UploadGateway::new(config.upload_folder.clone(), remote));

    // -----------------------------------------------------------------------
    // 4. Admin access
    // -----------------------------------------------------------------------
    let auth_config = config.clone();
    let auth = Arc::new(
        tokio::task::spawn_blocking(move || AdminAuth::from_config(&auth_config)).await?,
    );

    // Login attempts: burst of 5, refilled at 5 per minute
    let login_limiter = RateLimiter::for_login().trusting_proxies(config.trusted_proxy_hops);

    let app_state = AppState {
        content,
        messages,
        uploads,
        auth: auth.clone(),
        login_limiter: login_limiter.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 5. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            login_limiter.purge_stale(600.0).await;
        }
    });

    // Periodic session cleanup (every 10 minutes)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(600));
        loop {
            interval.tick().await;
            auth.sessions.purge_expired().await;
        }
    });

    // -----------------------------------------------------------------------
    // 6. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
