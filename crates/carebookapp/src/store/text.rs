use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::atomic::AtomicFileWriter;
use super::{CorruptLine, LoadReport, RecordStore};
use crate::codec::{self, DecodeError};
use crate::error::{CarebookError, Result};
use crate::model::PatientRecord;

const QUARANTINE_SUFFIX: &str = ".rejected";

/// The primary, human-readable store: one encoded record per line.
#[derive(Debug, Clone)]
pub struct TextFileStore {
    path: PathBuf,
    quarantine_path: PathBuf,
}

impl TextFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut quarantine = path.clone().into_os_string();
        quarantine.push(QUARANTINE_SUFFIX);
        Self {
            path,
            quarantine_path: PathBuf::from(quarantine),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn quarantine_path(&self) -> &Path {
        &self.quarantine_path
    }

    fn ensure_dir(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(CarebookError::Io)?;
            }
        }
        Ok(())
    }
}

impl RecordStore for TextFileStore {
    fn load(&self) -> Result<LoadReport> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LoadReport::default()),
            Err(e) => return Err(CarebookError::Io(e)),
        };

        let report = parse_lines(&bytes);
        tracing::debug!(
            path = %self.path.display(),
            records = report.records.len(),
            corrupt = report.corrupt_lines.len(),
            "Loaded primary store"
        );
        Ok(report)
    }

    fn save(&self, records: &[PatientRecord]) -> Result<()> {
        self.ensure_dir()?;
        let mut content = String::new();
        for record in records {
            content.push_str(&codec::encode(record));
            content.push('\n');
        }
        AtomicFileWriter::new(&self.path).write(content.as_bytes())?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "Saved primary store");
        Ok(())
    }

    fn quarantine(&self, lines: &[CorruptLine]) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        self.ensure_dir()?;
        let mut content = match fs::read(&self.quarantine_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(CarebookError::Io(e)),
        };
        if !content.is_empty() && !content.ends_with(b"\n") {
            content.push(b'\n');
        }
        for corrupt in lines {
            content.extend_from_slice(corrupt.line.as_bytes());
            content.push(b'\n');
        }
        AtomicFileWriter::new(&self.quarantine_path).write(&content)?;
        tracing::warn!(
            path = %self.quarantine_path.display(),
            lines = lines.len(),
            "Quarantined unreadable lines before rewriting primary store"
        );
        Ok(())
    }
}

/// Decodes each line on its own. Blank lines are skipped silently.
fn parse_lines(bytes: &[u8]) -> LoadReport {
    let mut report = LoadReport::default();

    for (idx, raw) in bytes.split(|&b| b == b'\n').enumerate() {
        let line_number = idx + 1;
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

        let decoded = match std::str::from_utf8(raw) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => codec::decode(line),
            Err(_) => Err(DecodeError::NotUtf8),
        };

        match decoded {
            Ok(record) => report.records.push(record),
            Err(reason) => {
                let line = String::from_utf8_lossy(raw).into_owned();
                tracing::warn!(line_number, %reason, "Skipping corrupted line in primary store");
                report.corrupt_lines.push(CorruptLine {
                    line_number,
                    line,
                    reason,
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{date, record};
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> TextFileStore {
        TextFileStore::new(dir.join("patients.txt"))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let report = store_in(dir.path()).load().unwrap();
        assert!(report.records.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn save_then_load_preserves_order_and_content() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let mut discharged = record("20261001-002", "Bo");
        discharged.discharge(date("2026-10-04")).unwrap();
        let records = vec![
            record("20261001-003", "Cy"),
            discharged,
            record("20261001-001", "Ada"),
        ];

        store.save(&records).unwrap();
        let report = store.load().unwrap();

        assert_eq!(report.records, records);
        assert!(report.is_clean());
    }

    #[test]
    fn file_is_one_line_per_record() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .save(&[record("20261001-001", "Ada"), record("20261001-002", "Bo")])
            .unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with('\n'));
        assert!(text.starts_with("20261001-001||Ada||"));
    }

    #[test]
    fn save_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let store = TextFileStore::new(dir.path().join("nested").join("patients.txt"));
        store.save(&[record("20261001-001", "Ada")]).unwrap();
        assert_eq!(store.load().unwrap().records.len(), 1);
    }

    #[test]
    fn saving_empty_set_truncates() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save(&[record("20261001-001", "Ada")]).unwrap();
        store.save(&[]).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "");
        assert!(store.load().unwrap().records.is_empty());
    }

    #[test]
    fn corrupt_line_is_skipped_and_reported() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let good: Vec<_> = ["20261001-001", "20261001-002", "20261001-003"]
            .iter()
            .map(|id| record(id, "Patient"))
            .collect();
        let content = format!(
            "{}\n{}\nthis||is||not||a||record\n{}\n",
            codec::encode(&good[0]),
            codec::encode(&good[1]),
            codec::encode(&good[2]),
        );
        fs::write(store.path(), content).unwrap();

        let report = store.load().unwrap();

        assert_eq!(report.records, good);
        assert_eq!(report.corrupt_lines.len(), 1);
        let corrupt = &report.corrupt_lines[0];
        assert_eq!(corrupt.line_number, 3);
        assert_eq!(corrupt.line, "this||is||not||a||record");
        assert_eq!(corrupt.reason, DecodeError::TooFewFields(5));
    }

    #[test]
    fn invalid_utf8_line_is_corrupt_not_fatal() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let mut bytes = codec::encode(&record("20261001-001", "Ada")).into_bytes();
        bytes.extend_from_slice(b"\n\xff\xfe broken\n");
        fs::write(store.path(), bytes).unwrap();

        let report = store.load().unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.corrupt_lines.len(), 1);
        assert_eq!(report.corrupt_lines[0].reason, DecodeError::NotUtf8);
    }

    #[test]
    fn crlf_and_blank_lines_are_tolerated() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let r = record("20261001-001", "Ada");
        fs::write(store.path(), format!("\r\n{}\r\n\n", codec::encode(&r))).unwrap();

        let report = store.load().unwrap();
        assert_eq!(report.records, vec![r]);
        assert!(report.is_clean());
    }

    #[test]
    fn quarantine_appends_raw_lines() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let corrupt = |n: usize, line: &str| CorruptLine {
            line_number: n,
            line: line.to_string(),
            reason: DecodeError::TooFewFields(1),
        };

        store.quarantine(&[corrupt(2, "garbage one")]).unwrap();
        store.quarantine(&[corrupt(5, "garbage two")]).unwrap();
        store.quarantine(&[]).unwrap();

        assert_eq!(
            fs::read_to_string(store.quarantine_path()).unwrap(),
            "garbage one\ngarbage two\n"
        );
        assert!(store
            .quarantine_path()
            .to_string_lossy()
            .ends_with("patients.txt.rejected"));
    }
}
