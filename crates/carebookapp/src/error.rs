use std::path::PathBuf;
use thiserror::Error;

use crate::intake::ValidationError;

#[derive(Error, Debug)]
pub enum CarebookError {
    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Patient already discharged: {0}")]
    AlreadyDischarged(String),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The temporary file was written but could not be moved over the target.
    /// The mutation is not persisted.
    #[error("Failed to finalize {}: {source}", path.display())]
    CriticalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No patient ID left after sequence {0}")]
    IdsExhausted(u64),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CarebookError>;
