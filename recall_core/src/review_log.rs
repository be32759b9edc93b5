//! Append-only review log.
//!
//! Every applied review is appended as one JSON line with file locking so
//! analytics can replay what was answered, when, and from which screen.

use crate::{CardId, Quality, Result, ReviewSource};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One applied review
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub flashcard_id: CardId,
    pub quality: Quality,
    pub source: ReviewSource,
    pub reviewed_at: DateTime<Utc>,
    pub interval_days: u32,
    pub ease_factor: f64,
}

/// Destination for review records
pub trait ReviewSink {
    fn append(&mut self, record: &ReviewRecord) -> Result<()>;
}

/// JSONL review log with file locking
pub struct JsonlReviewLog {
    path: PathBuf,
}

impl JsonlReviewLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl ReviewSink for JsonlReviewLog {
    fn append(&mut self, record: &ReviewRecord) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!(
            "Logged review of {} (quality {})",
            record.flashcard_id,
            record.quality.value()
        );
        Ok(())
    }
}

/// Read every record from a review log, skipping lines that fail to parse
pub fn read_reviews(path: &Path) -> Result<Vec<ReviewRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ReviewRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse review at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} reviews from {:?}", records.len(), path);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(quality: Quality) -> ReviewRecord {
        ReviewRecord {
            id: Uuid::new_v4(),
            flashcard_id: Uuid::new_v4(),
            quality,
            source: ReviewSource::Quiz,
            reviewed_at: Utc::now(),
            interval_days: 1,
            ease_factor: 2.5,
        }
    }

    #[test]
    fn test_append_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("reviews.wal");

        let mut log = JsonlReviewLog::new(&path);
        let first = record(Quality::Easy);
        log.append(&first).unwrap();
        log.append(&record(Quality::Difficult)).unwrap();

        let records = read_reviews(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, first.id);
        assert_eq!(records[1].quality, Quality::Difficult);
    }

    #[test]
    fn test_read_missing_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let records = read_reviews(&temp_dir.path().join("missing.wal")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("reviews.wal");

        let mut log = JsonlReviewLog::new(&path);
        log.append(&record(Quality::Correct)).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{\"truncated\":").unwrap();
        // Quality 4 is outside the verdict domain
        let mut bad = serde_json::to_value(record(Quality::Easy)).unwrap();
        bad["quality"] = serde_json::json!(4);
        writeln!(file, "{}", bad).unwrap();

        log.append(&record(Quality::Easy)).unwrap();

        let records = read_reviews(&path).unwrap();
        assert_eq!(records.len(), 2);
    }
}
