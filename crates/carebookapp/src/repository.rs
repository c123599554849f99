//! # Patient Repository
//!
//! The repository is the only entry point a UI needs. It owns a primary store, a
//! backup store, and a clock, and exposes:
//!
//! - [`add_patient`](PatientRepository::add_patient)
//! - [`get_patient`](PatientRepository::get_patient)
//! - [`get_all_patients`](PatientRepository::get_all_patients)
//! - [`get_all_patients_as_map`](PatientRepository::get_all_patients_as_map)
//! - [`update_patient`](PatientRepository::update_patient)
//! - [`discharge_patient`](PatientRepository::discharge_patient)
//!
//! plus the maintenance operations [`doctor`](PatientRepository::doctor) and
//! [`restore_backup`](PatientRepository::restore_backup).
//!
//! ## Mutation Pipeline
//!
//! Every mutating call runs the same steps:
//!
//! 1. Load the full record set from the primary store.
//! 2. Modify it in memory.
//! 3. If the load skipped corrupt lines, quarantine them (a failure aborts here).
//! 4. Save the full set to the primary store.
//! 5. Save the full set to the backup store. A failure is logged and ignored.
//!
//! Nothing is cached between calls, so every operation sees the file as it is now.
//! Two processes writing at once resolve as last-writer-wins.
//!
//! ## Duplicate IDs
//!
//! IDs are unique when assigned here, but a hand-edited file may repeat one. Lookups
//! and updates act on the first matching record in file order.

use rust_decimal::Decimal;

use crate::billing;
use crate::config::StoragePaths;
use crate::error::{CarebookError, Result};
use crate::ids::{self, Clock, SystemClock};
use crate::model::{NewPatient, PatientIndex, PatientRecord};
use crate::store::snapshot::SnapshotStore;
use crate::store::text::TextFileStore;
use crate::store::{BackupStore, CorruptLine, LoadReport, RecordStore};

pub struct PatientRepository<S: RecordStore, B: BackupStore> {
    store: S,
    backup: B,
    clock: Box<dyn Clock>,
}

/// The production repository: text primary, optional snapshot backup.
pub type FileRepository = PatientRepository<TextFileStore, Option<SnapshotStore>>;

impl<S: RecordStore, B: BackupStore> PatientRepository<S, B> {
    pub fn new(store: S, backup: B) -> Self {
        Self {
            store,
            backup,
            clock: Box::new(SystemClock),
        }
    }

    /// Replaces the clock used for ID prefixes and discharge dates.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backup(&self) -> &B {
        &self.backup
    }

    /// Admits a new patient and returns the stored record with its assigned ID.
    pub fn add_patient(&mut self, patient: NewPatient) -> Result<PatientRecord> {
        let LoadReport {
            mut records,
            corrupt_lines,
        } = self.store.load()?;

        let today = self.clock.today();
        let id = ids::next_patient_id(records.iter().map(|r| r.id.as_str()), today)?;
        let record = PatientRecord::admit(id, patient);
        record.check_invariants()?;

        records.push(record.clone());
        self.persist(&records, &corrupt_lines)?;
        tracing::info!(id = %record.id, "Admitted patient");
        Ok(record)
    }

    pub fn get_patient(&self, id: &str) -> Result<PatientRecord> {
        self.store
            .load()?
            .records
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| CarebookError::NotFound(id.to_string()))
    }

    /// All records in file order.
    pub fn get_all_patients(&self) -> Result<Vec<PatientRecord>> {
        Ok(self.store.load()?.records)
    }

    pub fn get_all_patients_as_map(&self) -> Result<PatientIndex> {
        let mut index = PatientIndex::new();
        for record in self.store.load()?.records {
            if !index.contains(&record.id) {
                index.insert(record);
            }
        }
        Ok(index)
    }

    /// Replaces the stored record that has `record.id`. Never inserts.
    pub fn update_patient(&mut self, record: PatientRecord) -> Result<()> {
        record.check_invariants()?;

        let LoadReport {
            mut records,
            corrupt_lines,
        } = self.store.load()?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| CarebookError::NotFound(record.id.clone()))?;
        *slot = record;

        self.persist(&records, &corrupt_lines)
    }

    /// Discharges the patient today. A second discharge is rejected.
    pub fn discharge_patient(&mut self, id: &str) -> Result<PatientRecord> {
        let LoadReport {
            mut records,
            corrupt_lines,
        } = self.store.load()?;
        let today = self.clock.today();

        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CarebookError::NotFound(id.to_string()))?;
        record.discharge(today)?;
        let discharged = record.clone();

        self.persist(&records, &corrupt_lines)?;
        tracing::info!(id, date = %today, "Discharged patient");
        Ok(discharged)
    }

    /// Sum of final bills over discharged patients.
    pub fn total_collected(&self) -> Result<Decimal> {
        let records = self.get_all_patients()?;
        Ok(billing::total_collected(&records))
    }

    /// Loads the primary store without changing anything, reporting corrupt lines.
    pub fn doctor(&self) -> Result<LoadReport> {
        self.store.load()
    }

    /// Replaces the primary store with `records` recovered from a backup.
    ///
    /// Refuses to overwrite a primary store that still holds anything unless `force`
    /// is set. Returns the number of records restored.
    pub fn restore_backup(&mut self, records: Vec<PatientRecord>, force: bool) -> Result<usize> {
        let current = self.store.load()?;
        let occupied = current.records.len() + current.corrupt_lines.len();
        if occupied > 0 && !force {
            return Err(CarebookError::Snapshot(format!(
                "primary store is not empty ({} lines); refusing to overwrite without force",
                occupied
            )));
        }
        for record in &records {
            record.check_invariants()?;
        }

        self.store.quarantine(&current.corrupt_lines)?;
        self.store.save(&records)?;
        tracing::info!(records = records.len(), "Restored primary store from backup");
        Ok(records.len())
    }

    fn persist(&self, records: &[PatientRecord], corrupt: &[CorruptLine]) -> Result<()> {
        self.store.quarantine(corrupt)?;
        self.store.save(records)?;
        if let Err(e) = self.backup.save_backup(records) {
            tracing::warn!(error = %e, "Backup write failed; primary store is up to date");
        }
        Ok(())
    }
}

impl FileRepository {
    /// Builds the production repository over the files named in `paths`.
    pub fn open(paths: &StoragePaths) -> Self {
        Self::new(
            TextFileStore::new(&paths.primary),
            paths.backup.as_ref().map(SnapshotStore::new),
        )
    }

    /// Reads the most recent backup snapshot, if backups are enabled and one exists.
    pub fn load_backup(&self) -> Result<Option<Vec<PatientRecord>>> {
        match &self.backup {
            Some(snapshot) => snapshot.load(),
            None => Err(CarebookError::Config(
                "backups are disabled (backup_enabled = false)".to_string(),
            )),
        }
    }
}
