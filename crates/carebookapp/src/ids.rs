//! # Patient IDs
//!
//! IDs look like `20261016-004`: the admission day, a dash, and a sequence number
//! padded to three digits.
//!
//! The sequence is one more than the highest sequence found across *all* existing IDs,
//! not just today's. Numbering therefore never resets at midnight, and a clock that
//! moves backwards can never hand out an ID that is already taken. IDs that do not
//! have the `YYYYMMDD-N` shape are ignored when looking for the maximum. A maximum
//! that cannot be incremented is an error rather than a wrapped or reused ID.

use chrono::{Local, NaiveDate};

use crate::error::{CarebookError, Result};

/// Source of "today" for ID prefixes and discharge dates.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn next_patient_id<'a, I>(existing: I, today: NaiveDate) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let max_seq = existing
        .into_iter()
        .filter_map(|id| {
            let seq = sequence_of(id);
            if seq.is_none() {
                tracing::debug!(id, "Ignoring malformed patient ID");
            }
            seq
        })
        .max()
        .unwrap_or(0);

    let next = max_seq
        .checked_add(1)
        .ok_or(CarebookError::IdsExhausted(max_seq))?;
    Ok(format!("{}-{:03}", today.format("%Y%m%d"), next))
}

/// Numeric suffix of a well-formed ID.
pub fn sequence_of(id: &str) -> Option<u64> {
    let (prefix, suffix) = id.split_once('-')?;
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if prefix.len() != 8 || !is_digits(prefix) || !is_digits(suffix) {
        return None;
    }
    suffix.parse().ok()
}
