//! # Carebook CLI
//!
//! A thin command-line client for the `carebookapp` library. This file only invokes
//! `cli::run()` and handles process termination; everything else lives in `src/cli/`.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/carebook/src/cli/)                │
//! │  - clap argument parsing (setup.rs)                  │
//! │  - logging + context wiring + dispatch (commands.rs) │
//! │  - plain-text and JSON output (render.rs)            │
//! └──────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌──────────────────────────────────────────────────────┐
//! │  carebookapp                                         │
//! │  - intake validation (PatientForm)                   │
//! │  - PatientRepository over text + snapshot files      │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The library never prints or exits. The CLI owns stdout, stderr, and exit codes:
//! results go to stdout, logs and errors to stderr, and any failure exits with 1.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
