//! # Configuration
//!
//! Carebook configuration is loaded with [`confique`] from layered sources.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `CAREBOOK_PRIMARY_FILE`, `CAREBOOK_BACKUP_FILE`,
//!    `CAREBOOK_BACKUP_ENABLED`.
//! 2. **Config file**: `carebook.toml` in the data directory, if present.
//! 3. **Compiled defaults**: `#[config(default = ...)]` below.
//!
//! The data directory itself is not a config key; see [`crate::init::resolve_data_dir`].
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `primary_file` | `patients.txt` | Canonical text store, relative to the data dir |
//! | `backup_file` | `patients.dat` | Backup snapshot, relative to the data dir |
//! | `backup_enabled` | `true` | Write the backup snapshot after each save |

use confique::Config;
use std::path::{Path, PathBuf};

use crate::error::{CarebookError, Result};

pub const CONFIG_FILE_NAME: &str = "carebook.toml";

#[derive(Config, Debug, Clone, PartialEq, Eq)]
pub struct CarebookConfig {
    /// File name of the primary text store.
    #[config(env = "CAREBOOK_PRIMARY_FILE", default = "patients.txt")]
    pub primary_file: String,

    /// File name of the backup snapshot.
    #[config(env = "CAREBOOK_BACKUP_FILE", default = "patients.dat")]
    pub backup_file: String,

    #[config(env = "CAREBOOK_BACKUP_ENABLED", default = true)]
    pub backup_enabled: bool,
}

impl Default for CarebookConfig {
    fn default() -> Self {
        Self {
            primary_file: "patients.txt".to_string(),
            backup_file: "patients.dat".to_string(),
            backup_enabled: true,
        }
    }
}

/// Resolved locations of every file the repository touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub data_dir: PathBuf,
    pub primary: PathBuf,
    /// `None` when backups are disabled.
    pub backup: Option<PathBuf>,
}

impl CarebookConfig {
    /// Loads configuration for `data_dir` from env, `carebook.toml`, and defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config = CarebookConfig::builder()
            .env()
            .file(data_dir.join(CONFIG_FILE_NAME))
            .load()
            .map_err(|e| CarebookError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.primary_file.trim().is_empty() {
            return Err(CarebookError::Config("primary_file must not be empty".into()));
        }
        if self.backup_enabled {
            if self.backup_file.trim().is_empty() {
                return Err(CarebookError::Config("backup_file must not be empty".into()));
            }
            if self.backup_file == self.primary_file {
                return Err(CarebookError::Config(
                    "backup_file must differ from primary_file".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn storage_paths(&self, data_dir: &Path) -> StoragePaths {
        StoragePaths {
            data_dir: data_dir.to_path_buf(),
            primary: data_dir.join(&self.primary_file),
            backup: self
                .backup_enabled
                .then(|| data_dir.join(&self.backup_file)),
        }
    }
}
