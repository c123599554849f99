use crate::config::{CarebookConfig, StoragePaths};
use crate::ids::FixedClock;
use crate::model::fixtures::date;
use crate::repository::FileRepository;
use std::path::PathBuf;
use tempfile::TempDir;

/// A file-backed repository in a fresh temporary data directory.
pub struct TestEnv {
    // Kept so the directory outlives the test.
    pub _temp_dir: TempDir,
    pub root: PathBuf,
    pub paths: StoragePaths,
    pub repository: FileRepository,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    /// Default config, clock fixed at 2026-10-16.
    pub fn new() -> Self {
        Self::with_config(CarebookConfig::default())
    }

    pub fn with_config(config: CarebookConfig) -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let paths = config.storage_paths(&root);
        let repository = FileRepository::open(&paths).with_clock(FixedClock(date("2026-10-16")));
        Self {
            _temp_dir: temp_dir,
            root,
            paths,
            repository,
        }
    }

    /// Contents of the primary text file, or an empty string if it does not exist.
    pub fn primary_text(&self) -> String {
        std::fs::read_to_string(&self.paths.primary).unwrap_or_default()
    }
}
