//! Destinations for classification results.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, RubricatorError};
use crate::history::record::{ClassificationRecord, Correction};
use crate::storage;

/// Trait for stores that keep classification history.
pub trait ResultSink: Send + Sync {
    /// Store one classification.
    fn record(&self, record: ClassificationRecord) -> Result<()>;

    /// Attach a correction to a stored record and return the updated record.
    fn apply_correction(&self, correction: Correction) -> Result<ClassificationRecord>;

    /// All stored records in insertion order, corrections applied.
    fn records(&self) -> Result<Vec<ClassificationRecord>>;

    /// Look up one record.
    fn get(&self, id: Uuid) -> Result<Option<ClassificationRecord>> {
        Ok(self.records()?.into_iter().find(|r| r.id == id))
    }

    fn name(&self) -> &str;
}

fn unknown_record(id: Uuid) -> RubricatorError {
    RubricatorError::invalid_input(format!("no classification record with id {id}"))
}

/// In-memory sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RwLock<Vec<ClassificationRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ResultSink for MemorySink {
    fn record(&self, record: ClassificationRecord) -> Result<()> {
        self.records.write().push(record);
        Ok(())
    }

    fn apply_correction(&self, correction: Correction) -> Result<ClassificationRecord> {
        let mut records = self.records.write();
        let record = records
            .iter_mut()
            .find(|r| r.id == correction.record_id)
            .ok_or_else(|| unknown_record(correction.record_id))?;
        record.correction = Some(correction);
        Ok(record.clone())
    }

    fn records(&self) -> Result<Vec<ClassificationRecord>> {
        Ok(self.records.read().clone())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Line in a history file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum HistoryEvent {
    Classification(ClassificationRecord),
    Correction(Correction),
}

/// Append-only JSON Lines history file.
///
/// Classifications and corrections are appended as events; reading replays
/// the file and folds each correction into its record.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replay(&self) -> Result<Vec<ClassificationRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let mut records: Vec<ClassificationRecord> = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let event: HistoryEvent = serde_json::from_str(line).map_err(|e| {
                RubricatorError::storage(format!(
                    "{}:{}: {e}",
                    self.path.display(),
                    number + 1
                ))
            })?;
            match event {
                HistoryEvent::Classification(record) => records.push(record),
                HistoryEvent::Correction(correction) => {
                    match records.iter_mut().find(|r| r.id == correction.record_id) {
                        Some(record) => record.correction = Some(correction),
                        None => log::warn!(
                            "{}:{}: correction for unknown record {}",
                            self.path.display(),
                            number + 1,
                            correction.record_id
                        ),
                    }
                }
            }
        }
        Ok(records)
    }
}

impl ResultSink for JsonlSink {
    fn record(&self, record: ClassificationRecord) -> Result<()> {
        let _guard = self.write_lock.lock();
        storage::append_json_line(&self.path, &HistoryEvent::Classification(record))
    }

    fn apply_correction(&self, correction: Correction) -> Result<ClassificationRecord> {
        let _guard = self.write_lock.lock();
        let mut record = self
            .replay()?
            .into_iter()
            .find(|r| r.id == correction.record_id)
            .ok_or_else(|| unknown_record(correction.record_id))?;

        storage::append_json_line(&self.path, &HistoryEvent::Correction(correction.clone()))?;
        record.correction = Some(correction);
        Ok(record)
    }

    fn records(&self) -> Result<Vec<ClassificationRecord>> {
        self.replay()
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}
