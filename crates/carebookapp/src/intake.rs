//! # Intake Validation
//!
//! The repository assumes well-formed input. This module is the layer in front of it:
//! it takes the raw strings a form (or the CLI) collects and turns them into typed
//! [`NewPatient`] / [`PatientRecord`] values, or a [`ValidationError`] naming the first
//! rule that failed.
//!
//! ## Rules
//!
//! - Name is required.
//! - Age is a whole number between 0 and 150.
//! - Base bill is a number, 0 or greater.
//! - Insurance discount is a number between 0 and 100.
//! - Admission date is required, `YYYY-MM-DD`.
//! - A discharged patient needs a discharge date, `YYYY-MM-DD`, on or after admission.
//!
//! Single-line fields are trimmed. Address and medical history keep their text as
//! entered, line breaks included.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::model::{NewPatient, PatientRecord, MAX_AGE};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Patient name is required")]
    NameRequired,

    #[error("Age must be a whole number, got '{0}'")]
    InvalidAge(String),

    #[error("Age must be between 0 and {max}, got {0}", max = MAX_AGE)]
    AgeOutOfRange(i64),

    #[error("{field} must be a number, got '{value}'")]
    InvalidAmount { field: &'static str, value: String },

    #[error("Base bill must be 0 or greater, got {0}")]
    NegativeBill(Decimal),

    #[error("Insurance discount must be between 0 and 100, got {0}")]
    DiscountOutOfRange(Decimal),

    #[error("{0} is required")]
    DateRequired(&'static str),

    #[error("{field} must be in YYYY-MM-DD format, got '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("Discharge date is required for a discharged patient")]
    DischargeDateRequired,

    #[error("Discharge date is set but the patient is not discharged")]
    DischargeDateWithoutDischarge,

    #[error("Discharge date {discharge} cannot be before admission date {admission}")]
    DischargeBeforeAdmission {
        admission: NaiveDate,
        discharge: NaiveDate,
    },
}

/// Raw form input, one string per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientForm {
    pub name: String,
    pub age: String,
    pub contact: String,
    pub address: String,
    pub medical_history: String,
    pub doctor_assigned: String,
    pub treatment_given: String,
    pub admission_date: String,
    pub base_bill: String,
    pub insurance_percent: String,
    pub discharged: bool,
    pub discharge_date: Option<String>,
}

impl PatientForm {
    /// Validates the form for admission. Discharge fields are ignored.
    pub fn validate_new(&self) -> Result<NewPatient, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::NameRequired);
        }
        Ok(NewPatient {
            name: name.to_string(),
            age: parse_age(&self.age)?,
            contact: self.contact.trim().to_string(),
            address: self.address.clone(),
            medical_history: self.medical_history.clone(),
            doctor_assigned: self.doctor_assigned.trim().to_string(),
            treatment_given: self.treatment_given.trim().to_string(),
            admission_date: parse_required_date(&self.admission_date, "Admission date")?,
            base_bill_amount: parse_base_bill(&self.base_bill)?,
            insurance_discount_percent: parse_discount(&self.insurance_percent)?,
        })
    }

    /// Validates the form as a full replacement for the record `id`.
    pub fn validate_update(&self, id: &str) -> Result<PatientRecord, ValidationError> {
        let patient = self.validate_new()?;
        let admission = patient.admission_date;
        let mut record = PatientRecord::admit(id.to_string(), patient);

        if self.discharged {
            let raw = self
                .discharge_date
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .ok_or(ValidationError::DischargeDateRequired)?;
            let discharge = parse_date(raw, "Discharge date")?;
            check_discharge_date(admission, discharge)?;
            record.discharged = true;
            record.discharge_date = Some(discharge);
        }
        Ok(record)
    }
}

/// Pre-fills a form from a stored record, e.g. for editing.
impl From<&PatientRecord> for PatientForm {
    fn from(record: &PatientRecord) -> Self {
        Self {
            name: record.name.clone(),
            age: record.age.to_string(),
            contact: record.contact.clone(),
            address: record.address.clone(),
            medical_history: record.medical_history.clone(),
            doctor_assigned: record.doctor_assigned.clone(),
            treatment_given: record.treatment_given.clone(),
            admission_date: record.admission_date.format(DATE_FORMAT).to_string(),
            base_bill: record.base_bill_amount.to_string(),
            insurance_percent: record.insurance_discount_percent.to_string(),
            discharged: record.discharged,
            discharge_date: record
                .discharge_date
                .map(|d| d.format(DATE_FORMAT).to_string()),
        }
    }
}

pub fn check_discharge_date(
    admission: NaiveDate,
    discharge: NaiveDate,
) -> Result<(), ValidationError> {
    if discharge < admission {
        return Err(ValidationError::DischargeBeforeAdmission {
            admission,
            discharge,
        });
    }
    Ok(())
}

pub fn parse_age(raw: &str) -> Result<u8, ValidationError> {
    let trimmed = raw.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::InvalidAge(trimmed.to_string()))?;
    if !(0..=i64::from(MAX_AGE)).contains(&value) {
        return Err(ValidationError::AgeOutOfRange(value));
    }
    // Range checked above.
    Ok(value as u8)
}

pub fn parse_base_bill(raw: &str) -> Result<Decimal, ValidationError> {
    let value = parse_amount(raw, "Base bill")?;
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeBill(value));
    }
    Ok(value)
}

pub fn parse_discount(raw: &str) -> Result<Decimal, ValidationError> {
    let value = parse_amount(raw, "Insurance discount")?;
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::DiscountOutOfRange(value));
    }
    Ok(value)
}

pub fn parse_required_date(raw: &str, field: &'static str) -> Result<NaiveDate, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::DateRequired(field));
    }
    parse_date(raw, field)
}

fn parse_date(raw: &str, field: &'static str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        field,
        value: trimmed.to_string(),
    })
}

fn parse_amount(raw: &str, field: &'static str) -> Result<Decimal, ValidationError> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed).map_err(|_| ValidationError::InvalidAmount {
        field,
        value: trimmed.to_string(),
    })
}
