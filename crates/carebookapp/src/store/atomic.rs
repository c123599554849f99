//! # Atomic File Replacement
//!
//! Every file carebook writes goes through [`AtomicFileWriter`]:
//!
//! 1. Create `.{name}-{uuid}.tmp` in the same directory as the target.
//! 2. Write all bytes, then `fsync` the temporary file.
//! 3. Rename it over the target (an atomic replace on the same filesystem).
//!
//! A reader of the target therefore sees either the old complete content or the new
//! complete content, never a mix, even if the process dies between steps.
//!
//! ## Failure Semantics
//!
//! - Step 1 or 2 fails: [`CarebookError::Io`]. The target is untouched.
//! - Step 3 fails: [`CarebookError::CriticalIo`]. The data is *not* persisted, even
//!   though the temporary file held a full copy.
//!
//! In both cases the temporary file is removed on a best-effort basis. A
//! [`StagedWrite`] that is dropped without [`StagedWrite::commit`] also removes its
//! temporary file, which is how an interrupted save is modelled.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{CarebookError, Result};

#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    target: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Writes `bytes` to a temporary file and renames it over the target.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        self.stage(bytes)?.commit()
    }

    /// Writes and syncs the temporary file, without touching the target yet.
    pub fn stage(&self, bytes: &[u8]) -> Result<StagedWrite> {
        let dir = parent_dir(&self.target);
        let name = self
            .target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("data");
        let staged = StagedWrite {
            temp: dir.join(format!(".{}-{}.tmp", name, Uuid::new_v4())),
            target: self.target.clone(),
            committed: false,
        };

        // On error `staged` is dropped here, which removes the partial file.
        let mut file = File::create(&staged.temp).map_err(CarebookError::Io)?;
        file.write_all(bytes).map_err(CarebookError::Io)?;
        file.sync_all().map_err(CarebookError::Io)?;
        drop(file);

        Ok(staged)
    }
}

/// A fully written temporary file waiting to replace its target.
#[derive(Debug)]
pub struct StagedWrite {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedWrite {
    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.temp, &self.target).map_err(|source| CarebookError::CriticalIo {
            path: self.target.clone(),
            source,
        })?;
        self.committed = true;
        sync_dir(parent_dir(&self.target));
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = fs::remove_file(&self.temp) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.temp.display(), "Could not remove temp file: {e}");
                }
            }
        }
    }
}

/// Convenience wrapper for a one-shot atomic write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    AtomicFileWriter::new(path).write(bytes)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Persists the rename itself. Best-effort.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(d) = File::open(dir) {
        let _ = d.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
