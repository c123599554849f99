//! # Record Line Codec
//!
//! Converts a [`PatientRecord`] to and from one line of the primary text file.
//! Pure: no I/O happens here.
//!
//! ## Line Format
//!
//! Fourteen fields joined by `||`, in this order:
//!
//! ```text
//! id||name||age||contact||address||medical_history||doctor_assigned||treatment_given
//!   ||admission_date||discharge_date||discharged||base_bill||discount_percent||final_bill
//! ```
//!
//! - Text fields are escaped with marker tokens: `\n` as `<NL>`, `\r` as `<CR>`, `|` as
//!   `<PIPE>` and `<` as `<LT>`. One record is therefore always exactly one line, and no
//!   field can produce the delimiter or a marker by accident. Decoding restores them.
//!   A `<` that does not start a marker is read back literally.
//! - Dates are ISO-8601 (`2026-10-16`); a missing date is the literal `null`.
//! - `discharged` is `true` or `false`.
//! - Amounts use the decimal's canonical text form (`.` separator, no grouping).
//!   The final bill is written with two decimals. It is checked to be a number on
//!   read but otherwise ignored: the value is always re-derived from its inputs.
//!
//! ## Legacy Lines
//!
//! Files written before `|` and `<` were escaped may hold a raw `|` in a text field.
//! Such a line can split into the wrong fields; it is then reported as corrupt like
//! any other unreadable line.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::intake::DATE_FORMAT;
use crate::model::PatientRecord;

pub const DELIMITER: &str = "||";
pub const NEWLINE_MARKER: &str = "<NL>";
pub const CARRIAGE_RETURN_MARKER: &str = "<CR>";
pub const PIPE_MARKER: &str = "<PIPE>";
pub const LESS_THAN_MARKER: &str = "<LT>";
pub const NULL_DATE: &str = "null";
pub const FIELD_COUNT: usize = 14;

/// Why a line could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} fields, found {0}", expected = FIELD_COUNT)]
    TooFewFields(usize),

    #[error("line is not valid UTF-8")]
    NotUtf8,

    #[error("invalid age '{0}'")]
    InvalidAge(String),

    #[error("invalid {field} '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("admission date is missing")]
    MissingAdmissionDate,

    #[error("invalid discharged flag '{0}'")]
    InvalidFlag(String),

    #[error("invalid {field} '{value}'")]
    InvalidAmount { field: &'static str, value: String },

    #[error("inconsistent record: {0}")]
    Inconsistent(String),
}

pub fn encode(record: &PatientRecord) -> String {
    let fields = [
        escape(&record.id),
        escape(&record.name),
        record.age.to_string(),
        escape(&record.contact),
        escape(&record.address),
        escape(&record.medical_history),
        escape(&record.doctor_assigned),
        escape(&record.treatment_given),
        format_date(Some(record.admission_date)),
        format_date(record.discharge_date),
        record.discharged.to_string(),
        record.base_bill_amount.to_string(),
        record.insurance_discount_percent.to_string(),
        format!("{:.2}", record.final_bill_amount()),
    ];
    fields.join(DELIMITER)
}

pub fn decode(line: &str) -> Result<PatientRecord, DecodeError> {
    let parts: Vec<&str> = line.split(DELIMITER).collect();
    if parts.len() < FIELD_COUNT {
        return Err(DecodeError::TooFewFields(parts.len()));
    }

    let age = parts[2]
        .trim()
        .parse::<u8>()
        .map_err(|_| DecodeError::InvalidAge(parts[2].to_string()))?;
    let admission_date =
        parse_date(parts[8], "admission date")?.ok_or(DecodeError::MissingAdmissionDate)?;
    let discharge_date = parse_date(parts[9], "discharge date")?;
    let discharged = match parts[10].trim() {
        "true" => true,
        "false" => false,
        other => return Err(DecodeError::InvalidFlag(other.to_string())),
    };
    let base_bill_amount = parse_amount(parts[11], "base bill")?;
    let insurance_discount_percent = parse_amount(parts[12], "discount percent")?;
    parse_amount(parts[13], "final bill")?;

    let record = PatientRecord {
        id: unescape(parts[0]),
        name: unescape(parts[1]),
        age,
        contact: unescape(parts[3]),
        address: unescape(parts[4]),
        medical_history: unescape(parts[5]),
        doctor_assigned: unescape(parts[6]),
        treatment_given: unescape(parts[7]),
        admission_date,
        discharge_date,
        discharged,
        base_bill_amount,
        insurance_discount_percent,
    };
    record
        .check_invariants()
        .map_err(|e| DecodeError::Inconsistent(e.to_string()))?;
    Ok(record)
}

const MARKERS: [(&str, char); 4] = [
    (NEWLINE_MARKER, '\n'),
    (CARRIAGE_RETURN_MARKER, '\r'),
    (PIPE_MARKER, '|'),
    (LESS_THAN_MARKER, '<'),
];

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match MARKERS.iter().find(|(_, raw)| *raw == c) {
            Some((marker, _)) => out.push_str(marker),
            None => out.push(c),
        }
    }
    out
}

/// Single left-to-right pass, so a restored `<` never starts a new marker.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match MARKERS.iter().find(|(marker, _)| rest.starts_with(marker)) {
            Some((marker, raw)) => {
                out.push(*raw);
                rest = &rest[marker.len()..];
            }
            None => {
                out.push('<');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format(DATE_FORMAT).to_string(),
        None => NULL_DATE.to_string(),
    }
}

fn parse_date(raw: &str, field: &'static str) -> Result<Option<NaiveDate>, DecodeError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == NULL_DATE {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|_| DecodeError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

fn parse_amount(raw: &str, field: &'static str) -> Result<Decimal, DecodeError> {
    Decimal::from_str(raw.trim()).map_err(|_| DecodeError::InvalidAmount {
        field,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{date, record};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = "20261001-001||Ada||42||555-0100||12 Harbour Road<NL>Flat 3||Asthma.<NL>Penicillin allergy.||Dr. Okafor||Nebulizer||2026-10-01||null||false||1000||10||900.00";

    #[test]
    fn encodes_fields_in_fixed_order() {
        let mut r = record("20261001-001", "Ada");
        r.medical_history = "Asthma.\nPenicillin allergy.".into();
        assert_eq!(encode(&r), SAMPLE);
    }

    #[test]
    fn decodes_known_line() {
        let r = decode(SAMPLE).unwrap();
        assert_eq!(r.id, "20261001-001");
        assert_eq!(r.address, "12 Harbour Road\nFlat 3");
        assert_eq!(r.medical_history, "Asthma.\nPenicillin allergy.");
        assert_eq!(r.admission_date, date("2026-10-01"));
        assert_eq!(r.discharge_date, None);
        assert_eq!(r.final_bill_amount(), dec!(900));
    }

    #[test]
    fn encoded_line_has_no_line_breaks() {
        let mut r = record("20261001-001", "Ada");
        r.name = "Line\r\nBreak".into();
        r.treatment_given = "a\nb\nc".into();
        let line = encode(&r);
        assert!(!line.contains('\n'));
        assert!(!line.contains('\r'));
        assert_eq!(decode(&line).unwrap(), r);
    }

    #[test]
    fn pipes_at_field_edges_survive() {
        let mut r = record("20261001-001", "Ada|");
        r.contact = "|555".into();
        r.address = "a||b|||c".into();
        let line = encode(&r);
        assert_eq!(line.split(DELIMITER).count(), FIELD_COUNT);
        assert!(line.starts_with("20261001-001||Ada<PIPE>||42||<PIPE>555||"));
        assert_eq!(decode(&line).unwrap(), r);
    }

    #[test]
    fn marker_text_is_kept_literally() {
        let mut r = record("20261001-001", "Ada");
        r.medical_history = "Typed <NL> by hand, <CR> and <LT> too".into();
        r.treatment_given = "<PIPE>< <<NL>".into();
        let line = encode(&r);
        assert!(line.contains("Typed <LT>NL> by hand"));
        assert_eq!(decode(&line).unwrap(), r);
    }

    #[test]
    fn stray_angle_bracket_reads_back_literally() {
        let line = SAMPLE.replace("||Nebulizer||", "||dose < 5mg <X>||");
        assert_eq!(decode(&line).unwrap().treatment_given, "dose < 5mg <X>");
    }

    #[test]
    fn discharged_record_round_trips() {
        let mut r = record("20261001-007", "Bo");
        r.discharge(date("2026-10-04")).unwrap();
        let line = encode(&r);
        assert!(line.contains("||2026-10-01||2026-10-04||true||"));
        assert_eq!(decode(&line).unwrap(), r);
    }

    #[test]
    fn accepts_legacy_number_formats() {
        let line = SAMPLE.replace("||1000||10||900.00", "||1000.0||10.0||900.0");
        let r = decode(&line).unwrap();
        assert_eq!(r.base_bill_amount, dec!(1000));
        assert_eq!(r.insurance_discount_percent, dec!(10));
    }

    #[test]
    fn too_few_fields_is_reported() {
        assert_eq!(
            decode("20261001-001||Ada||42"),
            Err(DecodeError::TooFewFields(3))
        );
        assert_eq!(decode(""), Err(DecodeError::TooFewFields(1)));
    }

    #[test]
    fn bad_field_values_are_reported() {
        let bad_age = SAMPLE.replace("||42||", "||forty||");
        assert_eq!(
            decode(&bad_age),
            Err(DecodeError::InvalidAge("forty".into()))
        );

        let bad_date = SAMPLE.replace("2026-10-01||null", "01/10/2026||null");
        assert!(matches!(
            decode(&bad_date),
            Err(DecodeError::InvalidDate { field: "admission date", .. })
        ));

        let no_admission = SAMPLE.replace("2026-10-01||null", "null||null");
        assert_eq!(decode(&no_admission), Err(DecodeError::MissingAdmissionDate));

        let bad_flag = SAMPLE.replace("||false||", "||maybe||");
        assert_eq!(
            decode(&bad_flag),
            Err(DecodeError::InvalidFlag("maybe".into()))
        );

        let bad_amount = SAMPLE.replace("||1000||", "||1,000||");
        assert!(matches!(
            decode(&bad_amount),
            Err(DecodeError::InvalidAmount { field: "base bill", .. })
        ));
    }

    #[test]
    fn discharged_without_date_is_inconsistent() {
        let line = SAMPLE.replace("||false||", "||true||");
        assert!(matches!(decode(&line), Err(DecodeError::Inconsistent(_))));
    }

    #[test]
    fn final_bill_field_is_not_trusted() {
        let line = SAMPLE.replace("||900.00", "||1.00");
        let r = decode(&line).unwrap();
        assert_eq!(r.final_bill_amount(), dec!(900.00));
    }

    fn text() -> impl Strategy<Value = String> {
        let body = "[a-zA-Z0-9 .,:;'()/@#|<>\\-\r\n\u{e9}\u{4e2d}]{0,40}";
        let marker_like = prop_oneof![
            Just(String::new()),
            Just("|".to_string()),
            Just("||".to_string()),
            Just("<NL>".to_string()),
            Just("<PIPE>".to_string()),
            Just("<LT>".to_string()),
            Just("<".to_string()),
        ];
        (marker_like.clone(), body, marker_like)
            .prop_map(|(head, mid, tail)| head + &mid + &tail)
    }

    fn amount() -> impl Strategy<Value = Decimal> {
        (0i64..10_000_000, 0u32..=2).prop_map(|(n, scale)| Decimal::new(n, scale))
    }

    prop_compose! {
        fn any_record()(
            seq in 1u32..1000,
            name in text(),
            age in 0u8..=150,
            contact in text(),
            address in text(),
            history in text(),
            doctor in text(),
            treatment in text(),
            admitted_offset in 0i64..3650,
            stay in proptest::option::of(0i64..90),
            base in amount(),
            pct in (0i64..=10_000).prop_map(|n| Decimal::new(n, 2)),
        ) -> PatientRecord {
            let admission_date = date("2020-01-01") + chrono::Duration::days(admitted_offset);
            PatientRecord {
                id: format!("20261001-{:03}", seq),
                name,
                age,
                contact,
                address,
                medical_history: history,
                doctor_assigned: doctor,
                treatment_given: treatment,
                admission_date,
                discharge_date: stay.map(|d| admission_date + chrono::Duration::days(d)),
                discharged: stay.is_some(),
                base_bill_amount: base,
                insurance_discount_percent: pct,
            }
        }
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(r in any_record()) {
            let line = encode(&r);
            prop_assert!(!line.contains('\n'));
            prop_assert_eq!(decode(&line).unwrap(), r);
        }
    }
}
