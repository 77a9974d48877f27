//! Off-site copies of the data files.
//!
//! Every time the store persists `data.json` or `messages.csv`, a job is
//! queued for a single worker task that reads the file and PUTs it to
//! `<backup_prefix>/<name>`. Jobs run one at a time in write order, and the
//! file is read when its job runs, so the last upload always carries the
//! latest content. One attempt, no retry; failures only show up in the log.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use trache_store::Mirror;

use crate::object_storage::RemoteStorage;

struct BackupJob {
    path: PathBuf,
    key_name: String,
}

pub struct BackupMirror {
    jobs: Option<mpsc::UnboundedSender<BackupJob>>,
}

impl BackupMirror {
    /// Start the upload worker for `remote`. Needs a Tokio runtime; without
    /// one, or without a bucket, mirroring is disabled.
    pub fn new(remote: Option<RemoteStorage>) -> Self {
        let Some(remote) = remote else {
            return Self { jobs: None };
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let (tx, rx) = mpsc::unbounded_channel();
                handle.spawn(run_worker(remote, rx));
                Self { jobs: Some(tx) }
            }
            Err(_) => {
                warn!("Backups disabled, no async runtime");
                Self { jobs: None }
            }
        }
    }
}

impl Mirror for BackupMirror {
    fn mirror(&self, local_path: &Path, key_name: &str) {
        let Some(jobs) = &self.jobs else {
            return;
        };
        let job = BackupJob {
            path: local_path.to_path_buf(),
            key_name: key_name.to_string(),
        };
        if jobs.send(job).is_err() {
            warn!(key_name, "Backup skipped, worker stopped");
        }
    }
}

async fn run_worker(remote: RemoteStorage, mut jobs: mpsc::UnboundedReceiver<BackupJob>) {
    while let Some(job) = jobs.recv().await {
        upload(&remote, job).await;
    }
}

async fn upload(remote: &RemoteStorage, job: BackupJob) {
    let body = match tokio::fs::read(&job.path).await {
        Ok(body) => body,
        Err(e) => {
            warn!(path = %job.path.display(), error = %e, "Backup skipped, file unreadable");
            return;
        }
    };

    let key = remote.backup_key(&job.key_name);
    let size = body.len();
    match remote
        .store
        .put_object(&key, body, backup_content_type(&key))
        .await
    {
        Ok(()) => debug!(key = %key, size, "Backed up data file"),
        Err(e) => warn!(key = %key, error = %e, "Backup upload failed"),
    }
}

fn backup_content_type(key: &str) -> Option<&'static str> {
    if key.ends_with(".json") {
        Some("application/json")
    } else if key.ends_with(".csv") {
        Some("text/csv")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObjectStorageConfig;
    use crate::object_storage::testing::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn mirror_with(store: Arc<MemoryStore>, backup_prefix: &str) -> BackupMirror {
        let mut config = ObjectStorageConfig::new("trache");
        config.backup_prefix = backup_prefix.to_string();
        BackupMirror::new(Some(RemoteStorage::new(store, &config)))
    }

    #[test]
    fn test_content_types() {
        assert_eq!(backup_content_type("backups/data.json"), Some("application/json"));
        assert_eq!(backup_content_type("backups/messages.csv"), Some("text/csv"));
        assert_eq!(backup_content_type("backups/notes.txt"), None);
    }

    async fn wait_for(store: &MemoryStore, count: usize) {
        for _ in 0..100 {
            if store.keys().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_mirror_uploads_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"{\"company_name\": \"X\"}").unwrap();

        let store = Arc::new(MemoryStore::default());
        let mirror = mirror_with(store.clone(), "/backups/");
        mirror.mirror(&path, "data.json");
        wait_for(&store, 1).await;

        let (body, content_type) = store.get("backups/data.json").unwrap();
        assert_eq!(body, b"{\"company_name\": \"X\"}");
        assert_eq!(content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_mirror_uploads_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.csv");
        std::fs::write(&path, b"Date,Nom,Email,Telephone,Message\n").unwrap();

        let store = Arc::new(MemoryStore::default());
        let mirror = mirror_with(store.clone(), "backups/");
        mirror.mirror(&path, "messages.csv");
        wait_for(&store, 1).await;

        assert_eq!(store.keys(), ["backups/messages.csv"]);
        let (_, content_type) = store.get("backups/messages.csv").unwrap();
        assert_eq!(content_type.as_deref(), Some("text/csv"));
    }

    #[tokio::test]
    async fn test_store_writes_are_mirrored() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::default());
        let mirror = Arc::new(mirror_with(store.clone(), "backups/"));

        let content = trache_store::ContentStore::new(dir.path().join("data.json"), mirror);
        content.load().unwrap();
        wait_for(&store, 1).await;

        let (body, _) = store.get("backups/data.json").unwrap();
        assert_eq!(body, std::fs::read(content.path()).unwrap());
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"{}").unwrap();

        let mirror = mirror_with(Arc::new(MemoryStore::failing()), "backups/");
        mirror.mirror(&path, "data.json");
        mirror.mirror(&dir.path().join("missing.json"), "missing.json");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_without_remote_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"{}").unwrap();

        BackupMirror::new(None).mirror(&path, "data.json");
    }

    #[test]
    fn test_mirror_outside_runtime_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"{}").unwrap();

        let store = Arc::new(MemoryStore::default());
        let mirror = mirror_with(store.clone(), "backups/");
        mirror.mirror(&path, "data.json");
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_slow_upload_does_not_overwrite_newer_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let store = Arc::new(MemoryStore::with_latency(b"old", Duration::from_millis(50)));
        let mirror = mirror_with(store.clone(), "backups/");

        std::fs::write(&path, b"old").unwrap();
        mirror.mirror(&path, "data.json");
        // Let the worker start on the slow upload.
        tokio::time::sleep(Duration::from_millis(10)).await;

        std::fs::write(&path, b"new").unwrap();
        mirror.mirror(&path, "data.json");
        wait_for(&store, 2).await;

        let (body, _) = store.get("backups/data.json").unwrap();
        assert_eq!(body, b"new");
        assert_eq!(store.keys().len(), 2);
    }

    #[tokio::test]
    async fn test_uploads_keep_write_order() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::default());
        let mirror = mirror_with(store.clone(), "backups/");

        for name in ["data.json", "messages.csv", "data.json"] {
            let path = dir.path().join(name);
            std::fs::write(&path, name).unwrap();
            mirror.mirror(&path, name);
        }
        wait_for(&store, 3).await;

        assert_eq!(
            store.keys(),
            ["backups/data.json", "backups/messages.csv", "backups/data.json"]
        );
    }
}
