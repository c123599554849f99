use carebookapp::intake::DATE_FORMAT;
use carebookapp::model::{PatientIndex, PatientRecord};
use carebookapp::store::LoadReport;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::fmt::Write;

const NAME_WIDTH: usize = 24;
const DOCTOR_WIDTH: usize = 18;

fn status(record: &PatientRecord) -> String {
    match record.discharge_date {
        Some(date) if record.discharged => format!("discharged {}", date.format(DATE_FORMAT)),
        _ => "admitted".to_string(),
    }
}

/// Cuts to `width` characters, marking the cut with `~`.
fn fit(text: &str, width: usize) -> String {
    let single_line = text.replace(['\r', '\n'], " ");
    if single_line.chars().count() <= width {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

pub fn patient_table(index: &PatientIndex) -> String {
    if index.is_empty() {
        return "No patients found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:<name$} {:>3}  {:<doc$} {:<10}  {:<21} {:>10}",
        "ID",
        "NAME",
        "AGE",
        "DOCTOR",
        "ADMITTED",
        "STATUS",
        "FINAL BILL",
        name = NAME_WIDTH,
        doc = DOCTOR_WIDTH,
    );
    for (id, record) in index.iter() {
        let _ = writeln!(
            out,
            "{:<14} {:<name$} {:>3}  {:<doc$} {:<10}  {:<21} {:>10.2}",
            id,
            fit(&record.name, NAME_WIDTH),
            record.age,
            fit(&record.doctor_assigned, DOCTOR_WIDTH),
            record.admission_date.format(DATE_FORMAT),
            status(record),
            record.final_bill_amount(),
            name = NAME_WIDTH,
            doc = DOCTOR_WIDTH,
        );
    }
    out
}

/// Records as a JSON array, each with its derived `final_bill_amount`.
pub fn patients_json(index: &PatientIndex) -> serde_json::Result<String> {
    let rows = index
        .iter()
        .map(|(_, record)| {
            let mut value = serde_json::to_value(record)?;
            if let Value::Object(map) = &mut value {
                map.insert(
                    "final_bill_amount".to_string(),
                    json!(format!("{:.2}", record.final_bill_amount())),
                );
            }
            Ok(value)
        })
        .collect::<serde_json::Result<Vec<Value>>>()?;
    serde_json::to_string_pretty(&rows)
}

/// Multi-line fields are indented under their label.
pub fn patient_detail(record: &PatientRecord) -> String {
    let mut out = String::new();
    let mut field = |label: &str, value: &str| {
        let mut lines = value.lines();
        let _ = writeln!(out, "{:<18}{}", format!("{}:", label), lines.next().unwrap_or(""));
        for line in lines {
            let _ = writeln!(out, "{:<18}{}", "", line);
        }
    };

    field("ID", &record.id);
    field("Name", &record.name);
    field("Age", &record.age.to_string());
    field("Contact", &record.contact);
    field("Address", &record.address);
    field("Medical history", &record.medical_history);
    field("Doctor", &record.doctor_assigned);
    field("Treatment", &record.treatment_given);
    field(
        "Admitted",
        &record.admission_date.format(DATE_FORMAT).to_string(),
    );
    field("Status", &status(record));
    field("Base bill", &format!("{:.2}", record.base_bill_amount));
    field(
        "Insurance",
        &format!("{}%", record.insurance_discount_percent.normalize()),
    );
    field("Final bill", &format!("{:.2}", record.final_bill_amount()));
    out
}

pub fn collected(total: Decimal, discharged: usize) -> String {
    format!(
        "Collected from {} discharged patient{}: {:.2}\n",
        discharged,
        if discharged == 1 { "" } else { "s" },
        total
    )
}

pub enum BackupState {
    Disabled,
    Missing,
    Present(usize),
    Unreadable(String),
}

pub fn doctor_report(primary: &str, report: &LoadReport, backup: &BackupState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Primary file: {}", primary);
    let _ = writeln!(out, "Readable records: {}", report.records.len());
    if report.is_clean() {
        let _ = writeln!(out, "Corrupt lines: none");
    } else {
        let _ = writeln!(out, "Corrupt lines: {}", report.corrupt_lines.len());
        for corrupt in &report.corrupt_lines {
            let _ = writeln!(
                out,
                "  line {}: {} | {}",
                corrupt.line_number,
                corrupt.reason,
                fit(&corrupt.line, 60)
            );
        }
        let _ = writeln!(
            out,
            "These lines are moved to the .rejected file on the next change."
        );
    }
    let backup_line = match backup {
        BackupState::Disabled => "disabled".to_string(),
        BackupState::Missing => "not written yet".to_string(),
        BackupState::Present(n) => format!("{} records", n),
        BackupState::Unreadable(reason) => format!("unreadable ({})", reason),
    };
    let _ = writeln!(out, "Backup: {}", backup_line);
    out
}
