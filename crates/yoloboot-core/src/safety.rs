//! The safety log: an append-only audit trail of stage outcomes.
//!
//! One JSONL record per stage, written by a single writer in the sequential
//! bootstrap. Structured fields (not free prose) so tests and tooling can
//! assert on them. No rotation — it lives for the life of the container.

use crate::error::Result;
use crate::stage::{StageReport, StageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyRecord {
    pub timestamp: DateTime<Utc>,
    pub stage: String,
    pub status: StageStatus,
    pub detail: String,
}

#[derive(Debug, Clone)]
pub struct SafetyLog {
    path: PathBuf,
}

impl SafetyLog {
    /// No filesystem access until the first append; the log-dirs stage must
    /// have created the parent directory by then.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn append(&self, report: &StageReport) -> Result<()> {
        self.append_record(&SafetyRecord {
            timestamp: Utc::now(),
            stage: report.stage.to_string(),
            status: report.status,
            detail: report.detail.clone(),
        })
    }

    fn append_record(&self, record: &SafetyRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        f.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Read all records back. Lines that fail to parse are skipped rather
    /// than failing the read — the log may contain records written by a
    /// newer or older orchestrator.
    pub fn read_all(&self) -> Result<Vec<SafetyRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let log = SafetyLog::new(dir.path().join("safety.log"));

        log.append(&StageReport::ok("materialize", "first run, 4 files copied"))
            .unwrap();
        log.append(&StageReport::failed("openvpn", "config not found"))
            .unwrap();

        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].stage, "materialize");
        assert_eq!(records[0].status, StageStatus::Ok);
        assert_eq!(records[1].status, StageStatus::Failed);
    }

    #[test]
    fn append_is_append_only() {
        let dir = TempDir::new().unwrap();
        let log = SafetyLog::new(dir.path().join("safety.log"));
        log.append(&StageReport::ok("a", "one")).unwrap();
        log.append(&StageReport::ok("b", "two")).unwrap();

        let records = log.read_all().unwrap();
        assert_eq!(records[0].stage, "a");
        assert_eq!(records[1].stage, "b");
    }

    #[test]
    fn unparseable_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("safety.log");
        std::fs::write(&path, "not json\n").unwrap();
        let log = SafetyLog::new(path);
        log.append(&StageReport::ok("a", "one")).unwrap();
        assert_eq!(log.read_all().unwrap().len(), 1);
    }

    #[test]
    fn missing_log_reads_empty() {
        let dir = TempDir::new().unwrap();
        let log = SafetyLog::new(dir.path().join("nope.log"));
        assert!(log.read_all().unwrap().is_empty());
    }
}
