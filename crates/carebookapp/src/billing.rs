//! Bill arithmetic.
//!
//! `final = base * (1 - discount / 100)`, rounded to cents with midpoint away
//! from zero.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::PatientRecord;

const CENTS: u32 = 2;

pub fn final_amount(base: Decimal, discount_percent: Decimal) -> Decimal {
    let factor = Decimal::ONE - discount_percent / Decimal::ONE_HUNDRED;
    (base * factor).round_dp_with_strategy(CENTS, RoundingStrategy::MidpointAwayFromZero)
}

/// Sum of final bills for discharged patients.
pub fn total_collected<'a, I>(records: I) -> Decimal
where
    I: IntoIterator<Item = &'a PatientRecord>,
{
    records
        .into_iter()
        .filter(|r| r.discharged)
        .map(PatientRecord::final_bill_amount)
        .sum()
}
