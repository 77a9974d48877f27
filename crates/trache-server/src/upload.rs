//! Image uploads: the bucket when one is configured, the local upload
//! root otherwise.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use trache_shared::constants::LOCAL_UPLOAD_PREFIX;
use trache_shared::filename::{extension, sanitize_filename};

use crate::object_storage::{ObjectStorageError, RemoteStorage};

/// One file part of a multipart form.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Name as sent by the browser, untrusted.
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Error)]
enum UploadError {
    #[error(transparent)]
    Remote(#[from] ObjectStorageError),

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Path traversal detected")]
    Traversal,
}

/// Verify that a resolved path stays within the expected base directory.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf, UploadError> {
    let mut resolved = base.to_path_buf();
    for component in target.strip_prefix(base).unwrap_or(target).components() {
        match component {
            Component::Normal(c) => resolved.push(c),
            Component::ParentDir => return Err(UploadError::Traversal),
            _ => {}
        }
    }
    if !resolved.starts_with(base) {
        return Err(UploadError::Traversal);
    }
    Ok(resolved)
}

pub struct UploadGateway {
    upload_root: PathBuf,
    remote: Option<RemoteStorage>,
}

impl UploadGateway {
    pub fn new(upload_root: PathBuf, remote: Option<RemoteStorage>) -> Self {
        info!(
            root = %upload_root.display(),
            remote = remote.is_some(),
            "Upload gateway initialized"
        );
        Self {
            upload_root,
            remote,
        }
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    /// Store `file` under `subdir` and return the reference to save in the
    /// document: a public URL for remote objects, `uploads/[<subdir>/]<name>`
    /// for local files.
    ///
    /// `None` means nothing was written: the name sanitized to nothing or
    /// has no extension, or the write failed (logged as a warning).
    pub async fn store(&self, file: &IncomingFile, subdir: &str) -> Option<String> {
        let Some(filename) = sanitize_filename(&file.file_name) else {
            debug!(original = %file.file_name, "Upload name sanitized to nothing, skipped");
            return None;
        };
        if extension(&filename).is_none() {
            debug!(filename = %filename, "Upload has no extension, skipped");
            return None;
        }

        let result = match &self.remote {
            Some(remote) => store_remote(remote, file, subdir, &filename).await,
            None => self.store_local(file, subdir, &filename).await,
        };

        match result {
            Ok(reference) => {
                info!(reference = %reference, size = file.data.len(), "Stored upload");
                Some(reference)
            }
            Err(e) => {
                warn!(filename = %filename, error = %e, "Upload failed");
                None
            }
        }
    }

    async fn store_local(
        &self,
        file: &IncomingFile,
        subdir: &str,
        filename: &str,
    ) -> Result<String, UploadError> {
        let subdir = subdir.trim_matches('/');
        let dir = ensure_within(&self.upload_root, &self.upload_root.join(subdir))?;
        let path = ensure_within(&self.upload_root, &dir.join(filename))?;

        fs::create_dir_all(&dir)
            .await
            .map_err(|source| UploadError::Write {
                path: dir.clone(),
                source,
            })?;
        fs::write(&path, &file.data)
            .await
            .map_err(|source| UploadError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(if subdir.is_empty() {
            format!("{LOCAL_UPLOAD_PREFIX}/{filename}")
        } else {
            format!("{LOCAL_UPLOAD_PREFIX}/{subdir}/{filename}")
        })
    }
}

async fn store_remote(
    remote: &RemoteStorage,
    file: &IncomingFile,
    subdir: &str,
    filename: &str,
) -> Result<String, UploadError> {
    let key = remote.upload_key(subdir, filename);
    let content_type = file
        .content_type
        .clone()
        .filter(|ct| !ct.is_empty())
        .unwrap_or_else(|| {
            mime_guess::from_path(filename)
                .first_or_octet_stream()
                .to_string()
        });

    remote
        .store
        .put_object(&key, file.data.to_vec(), Some(&content_type))
        .await?;
    Ok(remote.public_url(&key))
}
