//! # carebookapp
//!
//! Crash-safe local persistence for patient admission records, independent of any UI.
//!
//! ## Architecture
//!
//! ```text
//!   UI (CLI, GUI, ...)
//!        │  PatientForm ──validate──▶ NewPatient / PatientRecord      (intake)
//!        ▼
//!   PatientRepository<S: RecordStore, B: BackupStore>                 (repository)
//!        │  load full set → modify → save full set → backup (best-effort)
//!        ▼
//!   TextFileStore ──codec──▶ patients.txt     SnapshotStore ──▶ patients.dat
//!        └────────── AtomicFileWriter (temp file + rename) ──────────┘
//! ```
//!
//! - [`intake`] turns raw form strings into typed values and rejects bad input before
//!   the repository sees it.
//! - [`repository`] is the CRUD contract a UI consumes.
//! - [`store`] holds the storage traits and their file and memory implementations.
//! - [`codec`] is the pure line format of the primary file.
//! - [`config`] and [`init`] turn the environment into explicit paths.
//!
//! ## Quick Start
//!
//! ```no_run
//! use carebookapp::init::initialize;
//! use carebookapp::intake::PatientForm;
//!
//! # fn main() -> carebookapp::error::Result<()> {
//! let mut ctx = initialize(None)?;
//! let form = PatientForm {
//!     name: "Ada".into(),
//!     age: "42".into(),
//!     admission_date: "2026-10-16".into(),
//!     base_bill: "1000".into(),
//!     insurance_percent: "10".into(),
//!     ..Default::default()
//! };
//! let record = ctx.repository.add_patient(form.validate_new()?)?;
//! println!("{} owes {:.2}", record.id, record.final_bill_amount());
//! # Ok(())
//! # }
//! ```

pub mod billing;
pub mod codec;
pub mod config;
pub mod error;
pub mod ids;
pub mod init;
pub mod intake;
pub mod model;
pub mod repository;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
