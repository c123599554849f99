//! # Domain Model
//!
//! A [`PatientRecord`] is the only entity carebook persists. Records are independent
//! of each other: there are no references between them, and the record set is always
//! loaded and written as a whole.
//!
//! ## Lifecycle
//!
//! ```text
//!   NewPatient ──admit(id)──▶ Admitted ──discharge(date)──▶ Discharged
//! ```
//!
//! - The `id` is assigned once, by the repository, when the record is admitted.
//! - `discharge` is the only state transition. It can happen once, and the
//!   discharge date may not precede the admission date.
//! - Records are never deleted.
//!
//! ## Billing
//!
//! The final bill is never stored as an input. [`PatientRecord::final_bill_amount`]
//! derives it from the base amount and the insurance discount every time it is read,
//! so an edit to either input is reflected immediately.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::billing;
use crate::error::{CarebookError, Result};
use crate::intake::{check_discharge_date, ValidationError};

/// Upper bound (inclusive) for a patient's age.
pub const MAX_AGE: u8 = 150;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// `YYYYMMDD-NNN`, assigned by the repository at admission.
    pub id: String,
    pub name: String,
    pub age: u8,
    pub contact: String,
    pub address: String,
    pub medical_history: String,
    pub doctor_assigned: String,
    pub treatment_given: String,
    pub admission_date: NaiveDate,
    /// Present iff `discharged` is true.
    pub discharge_date: Option<NaiveDate>,
    pub discharged: bool,
    pub base_bill_amount: Decimal,
    pub insurance_discount_percent: Decimal,
}

/// Everything needed to admit a patient. The repository supplies the ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub name: String,
    pub age: u8,
    pub contact: String,
    pub address: String,
    pub medical_history: String,
    pub doctor_assigned: String,
    pub treatment_given: String,
    pub admission_date: NaiveDate,
    pub base_bill_amount: Decimal,
    pub insurance_discount_percent: Decimal,
}

impl PatientRecord {
    /// Builds an admitted (not yet discharged) record.
    pub fn admit(id: String, patient: NewPatient) -> Self {
        Self {
            id,
            name: patient.name,
            age: patient.age,
            contact: patient.contact,
            address: patient.address,
            medical_history: patient.medical_history,
            doctor_assigned: patient.doctor_assigned,
            treatment_given: patient.treatment_given,
            admission_date: patient.admission_date,
            discharge_date: None,
            discharged: false,
            base_bill_amount: patient.base_bill_amount,
            insurance_discount_percent: patient.insurance_discount_percent,
        }
    }

    pub fn final_bill_amount(&self) -> Decimal {
        billing::final_amount(self.base_bill_amount, self.insurance_discount_percent)
    }

    /// Marks the patient discharged on `on`.
    ///
    /// Fails with [`CarebookError::AlreadyDischarged`] on a second call; the
    /// existing discharge date is left untouched.
    pub fn discharge(&mut self, on: NaiveDate) -> Result<()> {
        if self.discharged {
            return Err(CarebookError::AlreadyDischarged(self.id.clone()));
        }
        check_discharge_date(self.admission_date, on)?;
        self.discharged = true;
        self.discharge_date = Some(on);
        Ok(())
    }

    /// Checks the discharge invariants.
    pub fn check_invariants(&self) -> std::result::Result<(), ValidationError> {
        if self.age > MAX_AGE {
            return Err(ValidationError::AgeOutOfRange(i64::from(self.age)));
        }
        match (self.discharged, self.discharge_date) {
            (true, Some(date)) => check_discharge_date(self.admission_date, date),
            (true, None) => Err(ValidationError::DischargeDateRequired),
            (false, Some(_)) => Err(ValidationError::DischargeDateWithoutDischarge),
            (false, None) => Ok(()),
        }
    }
}

/// Records keyed by ID, iterated in insertion (file) order.
#[derive(Debug, Clone, Default)]
pub struct PatientIndex {
    records: Vec<PatientRecord>,
    positions: HashMap<String, usize>,
}

impl PatientIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces by ID. A replaced record keeps its original position.
    pub fn insert(&mut self, record: PatientRecord) {
        match self.positions.get(&record.id) {
            Some(&pos) => self.records[pos] = record,
            None => {
                self.positions.insert(record.id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&PatientRecord> {
        self.positions.get(id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatientRecord)> {
        self.records.iter().map(|r| (r.id.as_str(), r))
    }

    pub fn into_records(self) -> Vec<PatientRecord> {
        self.records
    }
}

impl FromIterator<PatientRecord> for PatientIndex {
    fn from_iter<I: IntoIterator<Item = PatientRecord>>(iter: I) -> Self {
        let mut index = PatientIndex::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use std::str::FromStr;

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("fixture date")
    }

    pub fn new_patient(name: &str) -> NewPatient {
        NewPatient {
            name: name.to_string(),
            age: 42,
            contact: "555-0100".to_string(),
            address: "12 Harbour Road\nFlat 3".to_string(),
            medical_history: "Asthma since childhood.\nPenicillin allergy.".to_string(),
            doctor_assigned: "Dr. Okafor".to_string(),
            treatment_given: "Nebulizer".to_string(),
            admission_date: date("2026-10-01"),
            base_bill_amount: Decimal::from_str("1000").expect("fixture amount"),
            insurance_discount_percent: Decimal::from_str("10").expect("fixture percent"),
        }
    }

    pub fn record(id: &str, name: &str) -> PatientRecord {
        PatientRecord::admit(id.to_string(), new_patient(name))
    }
}
