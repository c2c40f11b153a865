//! Append-only record of completed turns.
//!
//! Each completed turn produces one [`LogRecord`]. The CSV sink writes a
//! header row when it creates the file and plain data rows afterwards. There
//! is no rotation, deduplication, or cross-process locking: writers in one
//! process are serialized, separate processes may interleave rows.
//!
//! [`summarize`] aggregates records by the condition that actually ran, so
//! `Rejection` and `rejection` count as one arm.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::experiment::{self, ExperimentCondition};

/// One completed turn. Field names double as the CSV header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Participant identifier.
    pub pid: String,
    /// When the participant's message was recorded (ISO-8601 UTC).
    pub user_time: String,
    /// The participant's message.
    pub user_text: String,
    /// When the partner reply was recorded (ISO-8601 UTC).
    pub bot_time: String,
    /// The partner reply, or a placeholder when generation failed.
    pub bot_text: String,
    /// Condition identifier as requested.
    pub condition: String,
    /// Latency tier tag that was applied.
    pub latency: String,
}

/// Errors writing or reading the turn log.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Filesystem failure.
    #[error("turn log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// CSV encoding or decoding failure.
    #[error("turn log CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Destination for turn records.
pub trait TurnLog: Send + Sync {
    /// Append one record.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if the record could not be written.
    fn append(&self, record: &LogRecord) -> Result<(), LogError>;
}

/// CSV file sink.
#[derive(Debug)]
pub struct CsvTurnLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvTurnLog {
    /// Create a sink writing to `path`. Nothing is touched until the first
    /// append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Destination file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TurnLog for CsvTurnLog {
    fn append(&self, record: &LogRecord) -> Result<(), LogError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let write_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        debug!(path = %self.path.display(), write_header, "turn record appended");
        Ok(())
    }
}

/// In-memory sink.
#[derive(Debug, Default)]
pub struct MemoryTurnLog {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryTurnLog {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record appended so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TurnLog for MemoryTurnLog {
    fn append(&self, record: &LogRecord) -> Result<(), LogError> {
        self.lock().push(record.clone());
        Ok(())
    }
}

/// Read every record from a CSV turn log.
///
/// # Errors
///
/// Returns [`LogError`] if the file cannot be opened or a row is malformed.
pub fn read_records(path: &Path) -> Result<Vec<LogRecord>, LogError> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize::<LogRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Turn counts for one resolved condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionSummary {
    /// Condition the turns ran under (`Neutral` for unknown identifiers).
    pub condition: ExperimentCondition,
    /// Number of turns.
    pub turns: usize,
    /// Turns per participant id.
    pub participants: BTreeMap<String, usize>,
    /// Turns per identifier exactly as written in the log.
    pub requested_ids: BTreeMap<String, usize>,
}

/// Aggregate view of a turn log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Number of records read.
    pub total_turns: usize,
    /// One entry per condition with at least one turn, in
    /// [`ExperimentCondition::ALL`] order.
    pub conditions: Vec<ConditionSummary>,
    /// Turns per participant id across all conditions.
    pub participants: BTreeMap<String, usize>,
}

impl Summary {
    /// Entry for `condition`, if any turn ran under it.
    pub fn condition(&self, condition: ExperimentCondition) -> Option<&ConditionSummary> {
        self.conditions.iter().find(|c| c.condition == condition)
    }
}

/// Count turns per resolved condition and per participant.
///
/// Identifiers are resolved the same way a turn resolves them, so spelling
/// variants of one condition share a row and unknown identifiers land under
/// `Neutral`.
pub fn summarize(records: &[LogRecord]) -> Summary {
    let mut participants = BTreeMap::new();
    let mut by_condition: Vec<ConditionSummary> = ExperimentCondition::ALL
        .into_iter()
        .map(|condition| ConditionSummary {
            condition,
            turns: 0,
            participants: BTreeMap::new(),
            requested_ids: BTreeMap::new(),
        })
        .collect();

    for record in records {
        let condition = experiment::resolve(&record.condition).condition;
        bump(&mut participants, &record.pid);
        if let Some(entry) = by_condition.iter_mut().find(|c| c.condition == condition) {
            entry.turns = entry.turns.saturating_add(1);
            bump(&mut entry.participants, &record.pid);
            bump(&mut entry.requested_ids, &record.condition);
        }
    }

    by_condition.retain(|c| c.turns > 0);
    Summary {
        total_turns: records.len(),
        conditions: by_condition,
        participants,
    }
}

fn bump(counts: &mut BTreeMap<String, usize>, key: &str) {
    let count = counts.entry(key.to_owned()).or_insert(0);
    *count = count.saturating_add(1);
}
