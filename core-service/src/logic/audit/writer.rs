//! Audit Log Writer
//!
//! Append-only JSONL sink. One complete line per `write_all` on an
//! append-mode handle, serialized by a mutex, so concurrent writers never
//! interleave partial records.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::record::AuditRecord;
use crate::error::AuditError;
use crate::logic::features::FeatureVector;
use crate::logic::model::ModelVersions;
use crate::logic::policy::Decision;

pub struct AuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
    records_written: AtomicU64,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            records_written: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended by this handle since it was created
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::SeqCst)
    }

    /// Append the audit record for a decision that has already been returned
    pub fn record(
        &self,
        decision: &Decision,
        features: &FeatureVector,
        model_versions: &ModelVersions,
    ) -> Result<AuditRecord, AuditError> {
        let record = AuditRecord::new(decision, features, model_versions);
        self.append(&record)?;
        Ok(record)
    }

    /// Append a prepared record
    pub fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = record.to_jsonl()?;
        line.push('\n');

        let _guard = self.write_lock.lock();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        file.sync_data()?;

        self.records_written.fetch_add(1, Ordering::SeqCst);
        log::debug!("Audit record appended: {} {}", record.decision, record.feature_hash);
        Ok(())
    }

    /// All records in insertion order. A missing log reads as empty;
    /// a malformed line is an error.
    pub fn read_records(&self) -> Result<Vec<AuditRecord>, AuditError> {
        Ok(self.read_entries()?.into_iter().map(|(_, record)| record).collect())
    }

    /// Records paired with their 1-based line number in the file.
    /// Blank lines are skipped but still counted.
    pub fn read_entries(&self) -> Result<Vec<(usize, AuditRecord)>, AuditError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| AuditError::Malformed {
                line: i + 1,
                reason: e.to_string(),
            })?;
            entries.push((i + 1, record));
        }

        Ok(entries)
    }

    /// Number of records in the log
    pub fn len(&self) -> Result<usize, AuditError> {
        Ok(self.read_records()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AuditError> {
        Ok(self.len()? == 0)
    }

    /// Records (with their file line numbers) whose fingerprint matches these features
    pub fn verify(&self, features: &FeatureVector) -> Result<Vec<(usize, AuditRecord)>, AuditError> {
        Ok(self
            .read_entries()?
            .into_iter()
            .filter(|(_, r)| r.matches(features))
            .collect())
    }
}
