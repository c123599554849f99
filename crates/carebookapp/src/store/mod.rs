//! # Storage Layer
//!
//! Two stores hold the same record set:
//!
//! 1. **Primary** ([`RecordStore`], production type [`text::TextFileStore`]): a
//!    line-oriented text file. It is the source of truth for every read.
//! 2. **Backup** ([`BackupStore`], production type [`snapshot::SnapshotStore`]): a
//!    compressed binary snapshot written after each successful primary save. Its
//!    failures are logged and swallowed by the repository.
//!
//! Both are rewritten in full on every mutation through [`atomic::AtomicFileWriter`].
//! Each file is atomic on its own; the pair is not. A crash between the two renames
//! leaves the backup one generation behind, which is acceptable because the backup
//! is never read automatically.
//!
//! ## Partial Failure on Load
//!
//! A line that cannot be decoded does not fail the load. It is skipped, logged, and
//! returned in [`LoadReport::corrupt_lines`] so the caller can see what was dropped.
//!
//! ## Implementations
//!
//! - [`text::TextFileStore`]: production primary store.
//! - [`snapshot::SnapshotStore`]: production backup store.
//! - [`memory::MemoryStore`]: in-memory stand-in for both, for tests.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//! ├── patients.txt            # Primary store, one record per line
//! ├── patients.txt.rejected   # Lines quarantined after failing to decode
//! ├── patients.dat            # Backup snapshot (gzip-compressed JSON)
//! └── carebook.toml           # Optional configuration
//! ```

use crate::codec::DecodeError;
use crate::error::Result;
use crate::model::PatientRecord;

pub mod atomic;
pub mod memory;
pub mod snapshot;
pub mod text;

/// A line of the primary file that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptLine {
    /// 1-based.
    pub line_number: usize,
    pub line: String,
    pub reason: DecodeError,
}

/// Outcome of loading the primary store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// In file order.
    pub records: Vec<PatientRecord>,
    pub corrupt_lines: Vec<CorruptLine>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.corrupt_lines.is_empty()
    }
}

/// The canonical store.
pub trait RecordStore {
    /// Loads every decodable record. A missing store is an empty one.
    fn load(&self) -> Result<LoadReport>;

    /// Replaces the stored set with `records`. Never a partial update.
    fn save(&self, records: &[PatientRecord]) -> Result<()>;

    /// Keeps a copy of lines that are about to be dropped by a rewrite.
    fn quarantine(&self, lines: &[CorruptLine]) -> Result<()>;
}

/// A secondary, non-authoritative copy of the record set.
pub trait BackupStore {
    fn save_backup(&self, records: &[PatientRecord]) -> Result<()>;
}

/// `None` disables backups.
impl<B: BackupStore> BackupStore for Option<B> {
    fn save_backup(&self, records: &[PatientRecord]) -> Result<()> {
        match self {
            Some(backup) => backup.save_backup(records),
            None => Ok(()),
        }
    }
}

