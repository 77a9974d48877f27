//! The content store: the JSON file behind every public page.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use trache_shared::constants::DOCUMENT_BACKUP_NAME;

use crate::error::{Result, StoreError};
use crate::fs::write_atomic;
use crate::mirror::Mirror;
use crate::models::SiteDocument;

/// Owns the on-disk [`SiteDocument`].
///
/// There is no cached copy: every [`load`](Self::load) reads the file and
/// hands back an owned snapshot, and changes only persist through
/// [`save`](Self::save). Two concurrent load/modify/save cycles are
/// last-writer-wins.
#[derive(Clone)]
pub struct ContentStore {
    path: PathBuf,
    mirror: Arc<dyn Mirror>,
}

impl ContentStore {
    pub fn new(path: impl Into<PathBuf>, mirror: Arc<dyn Mirror>) -> Self {
        Self {
            path: path.into(),
            mirror,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document with every missing key backfilled.
    ///
    /// - no file: the seed document is written and returned
    /// - legacy destination image paths are rewritten and the result saved
    ///   before returning
    /// - a file that does not parse as a site document is
    ///   [`StoreError::MalformedDocument`]
    pub fn load(&self) -> Result<SiteDocument> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No content document, writing seed");
                let document = SiteDocument::seed();
                self.save(&document)?;
                return Ok(document);
            }
            Err(e) => return Err(e.into()),
        };

        let mut document: SiteDocument =
            serde_json::from_slice(&raw).map_err(|source| StoreError::MalformedDocument {
                path: self.path.clone(),
                source,
            })?;

        if document.normalize_image_paths() {
            info!(path = %self.path.display(), "Normalized legacy image paths, saving");
            self.save(&document)?;
        }

        Ok(document)
    }

    /// Replace the whole document on disk, then hand the file to the mirror.
    pub fn save(&self, document: &SiteDocument) -> Result<()> {
        let bytes = to_pretty_json(document)?;
        write_atomic(&self.path, &bytes)?;
        debug!(path = %self.path.display(), size = bytes.len(), "Saved content document");

        self.mirror.mirror(&self.path, DOCUMENT_BACKUP_NAME);
        Ok(())
    }
}

/// Four-space indented JSON with non-ASCII characters written as-is.
fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}
