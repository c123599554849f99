//! # CLI Behavior
//!
//! One possible UI client for carebook. It maps each subcommand onto a single
//! repository call:
//!
//! | Command | Repository call |
//! |---------|-----------------|
//! | `add` | `add_patient` |
//! | `show <id>` | `get_patient` |
//! | `list [--json]` | `get_all_patients_as_map` |
//! | `update <id>` | `get_patient` + `update_patient` |
//! | `discharge <id>` | `discharge_patient` |
//! | `bills` | `total_collected` |
//! | `doctor` | `doctor` + `load_backup` |
//! | `restore-backup [--force]` | `load_backup` + `restore_backup` |
//!
//! `update` only changes the fields given on the command line; the rest are taken
//! from the stored record, and the merged form is validated as a whole.
//!
//! ## Module Structure
//!
//! - `setup`: argument parsing via clap
//! - `commands`: logging setup, context initialization, and per-command handlers
//! - `render`: output formatting

mod commands;
mod render;
pub mod setup;

pub use commands::run;
