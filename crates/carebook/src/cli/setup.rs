use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "carebook",
    bin_name = "carebook",
    version,
    disable_help_subcommand = true,
    about = "Patient admission records, stored as plain text",
    long_about = None,
    after_help = "Data directory: --data-dir, else $CAREBOOK_DATA_DIR, else the per-user data dir.\nLogging: set RUST_LOG (e.g. RUST_LOG=carebookapp=debug) or pass -v."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding patients.txt, patients.dat and carebook.toml
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Admit a new patient
    Add {
        #[command(flatten)]
        fields: PatientFields,
    },

    /// Show one patient in full
    Show { id: String },

    /// List all patients in file order
    #[command(alias = "ls")]
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Change a patient's details; fields not given keep their stored value
    Update {
        id: String,

        #[command(flatten)]
        fields: PatientFields,

        /// Set the discharged flag explicitly (true/false)
        #[arg(long, value_name = "BOOL")]
        discharged: Option<bool>,

        /// Discharge date, YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        discharge_date: Option<String>,
    },

    /// Discharge a patient today
    Discharge { id: String },

    /// Total of final bills collected from discharged patients
    Bills,

    /// Check the data files for unreadable lines and report the backup state
    Doctor,

    /// Replace the primary file with the contents of the backup snapshot
    RestoreBackup {
        /// Overwrite a primary file that still holds records
        #[arg(long)]
        force: bool,
    },
}

/// Patient form fields. Every value is passed to intake validation as typed.
#[derive(Args, Debug, Clone, Default)]
pub struct PatientFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub age: Option<String>,

    #[arg(long)]
    pub contact: Option<String>,

    /// Multi-line values are kept as given
    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub medical_history: Option<String>,

    #[arg(long = "doctor")]
    pub doctor_assigned: Option<String>,

    #[arg(long = "treatment")]
    pub treatment_given: Option<String>,

    /// YYYY-MM-DD; `add` defaults to today
    #[arg(long, value_name = "DATE")]
    pub admission_date: Option<String>,

    #[arg(long, value_name = "AMOUNT")]
    pub base_bill: Option<String>,

    /// Insurance discount in percent (0-100); `add` defaults to 0
    #[arg(long = "insurance", value_name = "PERCENT")]
    pub insurance_percent: Option<String>,
}
