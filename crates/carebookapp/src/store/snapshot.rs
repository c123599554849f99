//! Backup snapshot: the whole record set as gzip-compressed JSON.
//!
//! The snapshot is written after every successful save of the primary store and is
//! never read during normal operation. [`SnapshotStore::load`] exists for manual
//! recovery (`carebook restore-backup`).

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use super::atomic::AtomicFileWriter;
use super::BackupStore;
use crate::error::{CarebookError, Result};
use crate::model::PatientRecord;

/// Bumped whenever the snapshot layout changes incompatibly.
pub const SNAPSHOT_FORMAT: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    format: u32,
    written_at: DateTime<Utc>,
    records: Vec<PatientRecord>,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot back. `Ok(None)` when no snapshot has been written yet.
    pub fn load(&self) -> Result<Option<Vec<PatientRecord>>> {
        let compressed = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CarebookError::Io(e)),
        };

        let mut json = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut json)
            .map_err(|e| CarebookError::Snapshot(format!("cannot decompress: {}", e)))?;
        let snapshot: Snapshot = serde_json::from_slice(&json)
            .map_err(|e| CarebookError::Snapshot(format!("cannot parse: {}", e)))?;

        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(CarebookError::Snapshot(format!(
                "unsupported format {} (expected {})",
                snapshot.format, SNAPSHOT_FORMAT
            )));
        }
        for record in &snapshot.records {
            record.check_invariants().map_err(|e| {
                CarebookError::Snapshot(format!("record {} is inconsistent: {}", record.id, e))
            })?;
        }

        tracing::debug!(
            path = %self.path.display(),
            records = snapshot.records.len(),
            written_at = %snapshot.written_at,
            "Loaded backup snapshot"
        );
        Ok(Some(snapshot.records))
    }

    fn encode(records: &[PatientRecord]) -> Result<Vec<u8>> {
        let snapshot = Snapshot {
            format: SNAPSHOT_FORMAT,
            written_at: Utc::now(),
            records: records.to_vec(),
        };
        let json = serde_json::to_vec(&snapshot)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&json)
            .map_err(|e| CarebookError::Snapshot(format!("cannot compress: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| CarebookError::Snapshot(format!("cannot compress: {}", e)))
    }
}

impl BackupStore for SnapshotStore {
    fn save_backup(&self, records: &[PatientRecord]) -> Result<()> {
        let bytes = Self::encode(records)?;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        AtomicFileWriter::new(&self.path).write(&bytes)?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "Wrote backup snapshot");
        Ok(())
    }
}
