//! Contact-form submissions, one CSV row each.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use trache_shared::constants::{MESSAGES_BACKUP_NAME, MESSAGE_LOG_HEADER};

use crate::document::remove_at;
use crate::error::{Result, StoreError};
use crate::fs::write_atomic;
use crate::mirror::Mirror;
use crate::models::MessageRecord;

/// Append-mostly CSV log of [`MessageRecord`]s, in arrival order.
#[derive(Clone)]
pub struct MessageLog {
    path: PathBuf,
    mirror: Arc<dyn Mirror>,
}

impl MessageLog {
    pub fn new(path: impl Into<PathBuf>, mirror: Arc<dyn Mirror>) -> Self {
        Self {
            path: path.into(),
            mirror,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record, oldest first. Empty when the log does not exist yet.
    pub fn load_all(&self) -> Result<Vec<MessageRecord>> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }

    /// Add one record at the end, writing the header if the log is new.
    pub fn append(&self, record: &MessageRecord) -> Result<()> {
        let needs_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(MESSAGE_LOG_HEADER)?;
        }
        writer.serialize(record)?;
        writer.flush()?;

        debug!(path = %self.path.display(), name = %record.name, "Appended contact message");
        self.mirror.mirror(&self.path, MESSAGES_BACKUP_NAME);
        Ok(())
    }

    /// Remove the record at `ordinal` and rewrite the log.
    ///
    /// An ordinal past the end is ignored and `false` is returned; admin
    /// links can be stale and must not fail.
    pub fn delete_at(&self, ordinal: usize) -> Result<bool> {
        let mut records = self.load_all()?;
        if remove_at(&mut records, ordinal).is_none() {
            return Ok(false);
        }
        self.rewrite(&records)?;
        debug!(ordinal, remaining = records.len(), "Deleted contact message");
        Ok(true)
    }

    /// Replace the whole log with `records`, header included.
    pub fn rewrite(&self, records: &[MessageRecord]) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(MESSAGE_LOG_HEADER)?;
        for record in records {
            writer.serialize(record)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| StoreError::Io(e.into_error()))?;

        write_atomic(&self.path, &bytes)?;
        self.mirror.mirror(&self.path, MESSAGES_BACKUP_NAME);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::testing::RecordingMirror;
    use tempfile::TempDir;

    fn test_log() -> (MessageLog, Arc<RecordingMirror>, TempDir) {
        let dir = TempDir::new().unwrap();
        let mirror = Arc::new(RecordingMirror::default());
        let log = MessageLog::new(dir.path().join("messages.csv"), mirror.clone());
        (log, mirror, dir)
    }

    fn record(name: &str) -> MessageRecord {
        MessageRecord {
            date: "2024-01-01 10:00:00".into(),
            name: name.into(),
            email: format!("{}@x.com", name.to_lowercase()),
            phone: "0555".into(),
            message: format!("Bonjour de {name}"),
        }
    }

    #[test]
    fn test_missing_log_is_empty() {
        let (log, mirror, _dir) = test_log();
        assert!(log.load_all().unwrap().is_empty());
        assert!(mirror.keys().is_empty());
    }

    #[test]
    fn test_append_then_delete() {
        let (log, mirror, _dir) = test_log();
        let jean = MessageRecord {
            date: "2024-01-01 10:00:00".into(),
            name: "Jean".into(),
            email: "j@x.com".into(),
            phone: "0555".into(),
            message: "Bonjour".into(),
        };

        log.append(&jean).unwrap();
        assert_eq!(log.load_all().unwrap(), vec![jean]);

        assert!(log.delete_at(0).unwrap());
        assert!(log.load_all().unwrap().is_empty());
        assert_eq!(mirror.keys(), ["messages.csv", "messages.csv"]);
    }

    #[test]
    fn test_header_written_once() {
        let (log, _mirror, _dir) = test_log();
        log.append(&record("A")).unwrap();
        log.append(&record("B")).unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        let mut lines = raw.lines();
        assert_eq!(lines.next(), Some("Date,Nom,Email,Telephone,Message"));
        assert_eq!(raw.matches("Date,Nom").count(), 1);
        assert_eq!(log.load_all().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_preserves_order() {
        let (log, _mirror, _dir) = test_log();
        for name in ["A", "B", "C", "D"] {
            log.append(&record(name)).unwrap();
        }

        assert!(log.delete_at(1).unwrap());
        let names: Vec<_> = log.load_all().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["A", "C", "D"]);
    }

    #[test]
    fn test_delete_out_of_range_is_noop() {
        let (log, mirror, _dir) = test_log();
        log.append(&record("A")).unwrap();
        let before = std::fs::read(log.path()).unwrap();

        assert!(!log.delete_at(1).unwrap());
        assert!(!log.delete_at(usize::MAX).unwrap());
        assert_eq!(std::fs::read(log.path()).unwrap(), before);
        assert_eq!(mirror.keys().len(), 1);
    }

    #[test]
    fn test_delete_last_keeps_header() {
        let (log, _mirror, _dir) = test_log();
        log.append(&record("A")).unwrap();
        log.delete_at(0).unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw.trim_end(), "Date,Nom,Email,Telephone,Message");

        log.append(&record("B")).unwrap();
        assert_eq!(log.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_multiline_and_commas_survive() {
        let (log, _mirror, _dir) = test_log();
        let mut tricky = record("Amel");
        tricky.message = "Bonjour,\nje voudrais un \"devis\" pour Dubaï.".into();
        log.append(&tricky).unwrap();

        assert_eq!(log.load_all().unwrap(), vec![tricky]);
    }

    #[test]
    fn test_new_record_is_stamped() {
        let stamped = MessageRecord::new("Jean", "j@x.com", "0555", "Bonjour");
        assert_eq!(stamped.date.len(), "2024-01-01 10:00:00".len());
        assert_eq!(&stamped.date[4..5], "-");
        assert_eq!(&stamped.date[10..11], " ");
    }
}
