//! # CLI Layer
//!
//! The only place in the workspace that:
//! - knows about stdout and stderr
//! - installs a logging subscriber
//! - turns library errors into an exit status (via `main`)
//!
//! Each handler makes one or two repository calls and prints the result.

use anyhow::{anyhow, Context, Result};
use carebookapp::init::{initialize, CarebookContext};
use carebookapp::intake::{PatientForm, DATE_FORMAT};
use carebookapp::model::PatientRecord;
use chrono::Local;
use clap::Parser;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use super::render::{self, BackupState};
use super::setup::{Cli, Commands, PatientFields};

const DEFAULT_LOG_FILTER: &str = "carebook=warn,carebookapp=warn";
const VERBOSE_LOG_FILTER: &str = "carebook=debug,carebookapp=debug";

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut ctx = initialize(cli.data_dir.as_deref()).context("Failed to open patient records")?;
    tracing::debug!(data_dir = %ctx.paths.data_dir.display(), "Initialized");

    match cli.command {
        Commands::Add { fields } => handle_add(&mut ctx, fields),
        Commands::Show { id } => handle_show(&ctx, &id),
        Commands::List { json } => handle_list(&ctx, json),
        Commands::Update {
            id,
            fields,
            discharged,
            discharge_date,
        } => handle_update(&mut ctx, &id, fields, discharged, discharge_date),
        Commands::Discharge { id } => handle_discharge(&mut ctx, &id),
        Commands::Bills => handle_bills(&ctx),
        Commands::Doctor => handle_doctor(&ctx),
        Commands::RestoreBackup { force } => handle_restore(&mut ctx, force),
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `-v`. Always stderr.
fn init_logging(verbose: bool) {
    let default = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(verbose)
        .try_init();
}

/// Overlays the given flags onto `base`.
fn merge(base: PatientForm, fields: PatientFields) -> PatientForm {
    PatientForm {
        name: fields.name.unwrap_or(base.name),
        age: fields.age.unwrap_or(base.age),
        contact: fields.contact.unwrap_or(base.contact),
        address: fields.address.unwrap_or(base.address),
        medical_history: fields.medical_history.unwrap_or(base.medical_history),
        doctor_assigned: fields.doctor_assigned.unwrap_or(base.doctor_assigned),
        treatment_given: fields.treatment_given.unwrap_or(base.treatment_given),
        admission_date: fields.admission_date.unwrap_or(base.admission_date),
        base_bill: fields.base_bill.unwrap_or(base.base_bill),
        insurance_percent: fields.insurance_percent.unwrap_or(base.insurance_percent),
        ..base
    }
}

fn handle_add(ctx: &mut CarebookContext, fields: PatientFields) -> Result<()> {
    let defaults = PatientForm {
        admission_date: Local::now().date_naive().format(DATE_FORMAT).to_string(),
        insurance_percent: "0".to_string(),
        ..Default::default()
    };
    let patient = merge(defaults, fields).validate_new()?;
    let record = ctx.repository.add_patient(patient)?;
    println!(
        "Admitted {} as {} (final bill {:.2})",
        record.name,
        record.id,
        record.final_bill_amount()
    );
    Ok(())
}

fn handle_show(ctx: &CarebookContext, id: &str) -> Result<()> {
    let record = ctx.repository.get_patient(id)?;
    print!("{}", render::patient_detail(&record));
    Ok(())
}

fn handle_list(ctx: &CarebookContext, json: bool) -> Result<()> {
    let index = ctx.repository.get_all_patients_as_map()?;
    if json {
        println!("{}", render::patients_json(&index)?);
    } else {
        print!("{}", render::patient_table(&index));
    }
    Ok(())
}

fn handle_update(
    ctx: &mut CarebookContext,
    id: &str,
    fields: PatientFields,
    discharged: Option<bool>,
    discharge_date: Option<String>,
) -> Result<()> {
    let current = ctx.repository.get_patient(id)?;
    let mut form = merge(PatientForm::from(&current), fields);
    if let Some(flag) = discharged {
        form.discharged = flag;
    }
    if let Some(date) = discharge_date {
        form.discharge_date = Some(date);
    }

    let updated: PatientRecord = form.validate_update(id)?;
    ctx.repository.update_patient(updated)?;
    println!("Updated {}", id);
    Ok(())
}

fn handle_discharge(ctx: &mut CarebookContext, id: &str) -> Result<()> {
    let record = ctx.repository.discharge_patient(id)?;
    let date = record
        .discharge_date
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default();
    println!(
        "Discharged {} ({}) on {}; final bill {:.2}",
        record.name,
        record.id,
        date,
        record.final_bill_amount()
    );
    Ok(())
}

fn handle_bills(ctx: &CarebookContext) -> Result<()> {
    let total = ctx.repository.total_collected()?;
    let discharged = ctx
        .repository
        .get_all_patients()?
        .iter()
        .filter(|r| r.discharged)
        .count();
    print!("{}", render::collected(total, discharged));
    Ok(())
}

fn handle_doctor(ctx: &CarebookContext) -> Result<()> {
    let report = ctx.repository.doctor()?;
    let backup = if ctx.paths.backup.is_none() {
        BackupState::Disabled
    } else {
        match ctx.repository.load_backup() {
            Ok(Some(records)) => BackupState::Present(records.len()),
            Ok(None) => BackupState::Missing,
            Err(e) => BackupState::Unreadable(e.to_string()),
        }
    };
    print!(
        "{}",
        render::doctor_report(&ctx.paths.primary.display().to_string(), &report, &backup)
    );
    Ok(())
}

fn handle_restore(ctx: &mut CarebookContext, force: bool) -> Result<()> {
    let backup_path = ctx
        .paths
        .backup
        .clone()
        .ok_or_else(|| anyhow!("Backups are disabled in carebook.toml"))?;
    let records = ctx
        .repository
        .load_backup()?
        .ok_or_else(|| anyhow!("No backup found at {}", backup_path.display()))?;
    let restored = ctx.repository.restore_backup(records, force)?;
    println!(
        "Restored {} patients from {}",
        restored,
        backup_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_unset_fields() {
        let base = PatientForm {
            name: "Ada".into(),
            age: "42".into(),
            doctor_assigned: "Dr. Okafor".into(),
            discharged: true,
            discharge_date: Some("2026-10-05".into()),
            ..Default::default()
        };
        let fields = PatientFields {
            age: Some("43".into()),
            ..Default::default()
        };

        let merged = merge(base, fields);

        assert_eq!(merged.name, "Ada");
        assert_eq!(merged.age, "43");
        assert_eq!(merged.doctor_assigned, "Dr. Okafor");
        assert!(merged.discharged);
        assert_eq!(merged.discharge_date.as_deref(), Some("2026-10-05"));
    }
}
