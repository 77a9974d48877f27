//! Hook for replicating data files after they are written.

use std::path::Path;

/// Receives every data file the store has just persisted.
///
/// Implementations are best-effort: they must not block on the network and
/// must swallow (and log) their own failures. The store never learns whether
/// a mirror succeeded.
pub trait Mirror: Send + Sync {
    fn mirror(&self, local_path: &Path, key_name: &str);
}

/// Mirror that does nothing, for deployments without remote storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMirror;

impl Mirror for NoMirror {
    fn mirror(&self, _local_path: &Path, _key_name: &str) {}
}
