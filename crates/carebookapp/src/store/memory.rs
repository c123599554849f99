use std::cell::RefCell;

use super::{BackupStore, CorruptLine, LoadReport, RecordStore};
use crate::codec;
use crate::error::{CarebookError, Result};
use crate::model::PatientRecord;

/// In-memory primary and backup store for tests.
///
/// Records are kept as encoded lines, so loads go through the same codec as the
/// text file and corrupt lines can be injected with [`MemoryStore::push_raw_line`].
/// Uses `RefCell` because carebook is single-threaded and the store traits take `&self`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lines: RefCell<Vec<String>>,
    backup: RefCell<Option<Vec<PatientRecord>>>,
    quarantined: RefCell<Vec<String>>,
    saves: RefCell<usize>,
    simulate_write_error: RefCell<bool>,
    simulate_backup_error: RefCell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: &[PatientRecord]) -> Self {
        let store = Self::new();
        *store.lines.borrow_mut() = records.iter().map(codec::encode).collect();
        store
    }

    /// Makes every subsequent primary write fail.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Makes every subsequent backup write fail.
    pub fn set_simulate_backup_error(&self, simulate: bool) {
        *self.simulate_backup_error.borrow_mut() = simulate;
    }

    /// Appends a line verbatim, bypassing the encoder.
    pub fn push_raw_line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }

    pub fn raw_lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn backup(&self) -> Option<Vec<PatientRecord>> {
        self.backup.borrow().clone()
    }

    pub fn quarantined(&self) -> Vec<String> {
        self.quarantined.borrow().clone()
    }

    /// Number of successful primary saves.
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

fn simulated(what: &str) -> CarebookError {
    CarebookError::Io(std::io::Error::other(format!("Simulated {} error", what)))
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        for (idx, line) in self.lines.borrow().iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match codec::decode(line) {
                Ok(record) => report.records.push(record),
                Err(reason) => report.corrupt_lines.push(CorruptLine {
                    line_number: idx + 1,
                    line: line.clone(),
                    reason,
                }),
            }
        }
        Ok(report)
    }

    fn save(&self, records: &[PatientRecord]) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(simulated("write"));
        }
        *self.lines.borrow_mut() = records.iter().map(codec::encode).collect();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }

    fn quarantine(&self, lines: &[CorruptLine]) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(simulated("write"));
        }
        self.quarantined
            .borrow_mut()
            .extend(lines.iter().map(|c| c.line.clone()));
        Ok(())
    }
}

impl BackupStore for MemoryStore {
    fn save_backup(&self, records: &[PatientRecord]) -> Result<()> {
        if *self.simulate_backup_error.borrow() {
            return Err(simulated("backup"));
        }
        *self.backup.borrow_mut() = Some(records.to_vec());
        Ok(())
    }
}
