//! Workout history log.
//!
//! Finished sessions are appended to a JSONL (JSON Lines) file with file
//! locking so a second process never interleaves a half-written record.
//! Readers get records newest first.

use crate::{HistoryRecord, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Destination for finished session records
pub trait HistorySink {
    fn append(&mut self, record: &HistoryRecord) -> Result<()>;
}

/// In-memory sink, most useful in tests
impl HistorySink for Vec<HistoryRecord> {
    fn append(&mut self, record: &HistoryRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// JSONL-based history sink with file locking
pub struct JsonlHistorySink {
    path: PathBuf,
}

impl JsonlHistorySink {
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

impl HistorySink for JsonlHistorySink {
    fn append(&mut self, record: &HistoryRecord) -> Result<()> {
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

        tracing::debug!("Appended history record {} to {:?}", record.id, self.path);
        Ok(())
    }
}

/// Read all history records, newest first
///
/// Lines that fail to parse are skipped with a warning.
pub fn read_history(path: &Path) -> Result<Vec<HistoryRecord>> {
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

        match serde_json::from_str::<HistoryRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse history record at line {}: {}",
                    line_num + 1,
                    e
                );
            }
        }
    }

    file.unlock()?;

    // Append order is oldest first; a stable sort keeps ties in reverse append order
    records.reverse();
    records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    tracing::debug!("Read {} history records", records.len());
    Ok(records)
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Human-readable session length
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "N/A".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{} {}", plural(hours, "hour"), plural(minutes, "minute"))
    } else if minutes > 0 && secs > 0 {
        format!("{} {}", plural(minutes, "minute"), plural(secs, "second"))
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        plural(secs, "second")
    }
}
