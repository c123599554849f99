//! # Initialization
//!
//! Turns ambient state (CLI flags, environment, user profile) into an explicit
//! [`StoragePaths`] and builds the repository from it. Nothing below this module
//! looks at the environment, so tests can point a repository anywhere.
//!
//! ## Data Directory Resolution
//!
//! [`resolve_data_dir`] picks the first of:
//!
//! 1. An explicit override (the CLI's `--data-dir`).
//! 2. The `CAREBOOK_DATA_DIR` environment variable, if set and non-empty.
//! 3. The per-user data directory from the `directories` crate
//!    (e.g. `~/.local/share/carebook` on Linux).
//!
//! The directory is created if it does not exist yet.

use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{CarebookConfig, StoragePaths};
use crate::error::{CarebookError, Result};
use crate::repository::FileRepository;

pub const DATA_DIR_ENV: &str = "CAREBOOK_DATA_DIR";

pub struct CarebookContext {
    pub repository: FileRepository,
    pub config: CarebookConfig,
    pub paths: StoragePaths,
}

pub fn resolve_data_dir(data_override: Option<&Path>) -> Result<PathBuf> {
    let dir = match data_override {
        Some(path) => path.to_path_buf(),
        None => match std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            Some(env_dir) => PathBuf::from(env_dir),
            None => default_data_dir()?,
        },
    };

    if !dir.exists() {
        fs::create_dir_all(&dir)?;
        tracing::debug!(path = %dir.display(), "Created data directory");
    }
    Ok(dir)
}

fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "carebook", "carebook")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            CarebookError::Config(format!(
                "cannot determine a home directory; set {} or pass --data-dir",
                DATA_DIR_ENV
            ))
        })
}

/// Resolves the data directory, loads configuration, and opens the repository.
pub fn initialize(data_override: Option<&Path>) -> Result<CarebookContext> {
    let data_dir = resolve_data_dir(data_override)?;
    let config = CarebookConfig::load(&data_dir)?;
    let paths = config.storage_paths(&data_dir);
    tracing::debug!(
        primary = %paths.primary.display(),
        backup = ?paths.backup,
        "Opening patient repository"
    );
    let repository = FileRepository::open(&paths);

    Ok(CarebookContext {
        repository,
        config,
        paths,
    })
}
