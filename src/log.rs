use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::classifier::Classifier;
use crate::error::TriageError;
use crate::models::{ClassificationResult, PredictionLogEntry, SymptomRecord};

/// Append-only prediction log, one JSON entry per line. This type owns the
/// write path exclusively; entries are never edited or removed through it.
#[derive(Debug)]
pub struct PredictionLog {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl PredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry. The whole line is serialized up front and written
    /// with a single `write_all`, flushed to disk before the lock is
    /// released, so a concurrent reader never sees a partial entry.
    pub fn append(&self, result: &ClassificationResult) -> Result<(), TriageError> {
        let entry = PredictionLogEntry::from(result);
        let mut line = serde_json::to_string(&entry)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        line.push('\n');

        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// Streams the log line by line. A malformed line (for example the tail
    /// left by a crash mid-write) is skipped with a data-quality warning
    /// instead of aborting the read. A missing file reads as empty.
    pub fn read_entries(&self) -> Result<Vec<PredictionLogEntry>, TriageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<PredictionLogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    tracing::warn!(
                        line = index + 1,
                        %err,
                        path = %self.path.display(),
                        "skipping malformed prediction log line"
                    );
                }
            }
        }
        Ok(entries)
    }
}

/// Classifies one patient per CSV row and records each prediction. The
/// header row names the symptom columns, plus an optional `age` column;
/// empty cells are treated as unreported. Returns (recorded, skipped).
pub fn import_csv(
    classifier: &Classifier,
    log: &PredictionLog,
    path: &Path,
) -> anyhow::Result<(usize, usize)> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut recorded = 0usize;
    let mut skipped = 0usize;
    for (index, row) in reader.records().enumerate() {
        // header row is line 1
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                tracing::warn!(row = index + 2, %err, "skipping unreadable row");
                skipped += 1;
                continue;
            }
        };
        match classify_row(classifier, &headers, &row) {
            Ok(result) => {
                log.append(&result)?;
                recorded += 1;
            }
            Err(err) => {
                tracing::warn!(row = index + 2, %err, "skipping unclassifiable row");
                skipped += 1;
            }
        }
    }
    Ok((recorded, skipped))
}

fn classify_row(
    classifier: &Classifier,
    headers: &csv::StringRecord,
    row: &csv::StringRecord,
) -> Result<ClassificationResult, TriageError> {
    let mut pairs = Vec::new();
    let mut age = None;
    for (header, value) in headers.iter().zip(row.iter()) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if header == "age" {
            age = Some(value.parse::<u32>().map_err(|_| {
                TriageError::Validation(format!(
                    "age must be a non-negative integer, got {value:?}"
                ))
            })?);
            continue;
        }
        let intensity = value.parse::<u8>().map_err(|_| {
            TriageError::Validation(format!(
                "intensity for {header} must be an integer between 0 and 10, got {value:?}"
            ))
        })?;
        pairs.push((header, intensity));
    }

    let record = SymptomRecord::from_named(pairs)?;
    classifier.classify(&record, age)
}
