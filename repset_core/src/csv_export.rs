//! CSV export of workout history.
//!
//! History is flattened to one row per recorded set so it can be opened in a
//! spreadsheet. Skipped exercises get a single row with empty set columns.
//! Each export is a full snapshot of the history, so re-exporting to the same
//! path replaces the old file.

use crate::{Error, HistoryRecord, Result};
use std::path::Path;
use tempfile::NamedTempFile;

const CSV_HEADERS: [&str; 11] = [
    "history_id",
    "workout_name",
    "completed_at",
    "duration_seconds",
    "exercise_name",
    "target_reps",
    "target_sets",
    "set_number",
    "reps",
    "weight",
    "completed",
];

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    history_id: String,
    workout_name: String,
    completed_at: String,
    duration_seconds: u64,
    exercise_name: String,
    target_reps: u32,
    target_sets: u32,
    set_number: Option<u32>,
    reps: Option<u32>,
    weight: Option<String>,
    completed: Option<bool>,
}

fn rows_for(record: &HistoryRecord) -> Vec<CsvRow> {
    let mut rows = Vec::new();

    for exercise in &record.exercises {
        let base = || CsvRow {
            history_id: record.id.to_string(),
            workout_name: record.workout_name.clone(),
            completed_at: record.completed_at.to_rfc3339(),
            duration_seconds: record.duration,
            exercise_name: exercise.exercise_name.clone(),
            target_reps: exercise.target_reps,
            target_sets: exercise.target_sets,
            set_number: None,
            reps: None,
            weight: None,
            completed: None,
        };

        if exercise.was_skipped() {
            rows.push(base());
            continue;
        }

        for set in &exercise.sets {
            rows.push(CsvRow {
                set_number: Some(set.set_number),
                reps: Some(set.reps),
                weight: Some(set.weight.to_string()),
                completed: Some(set.completed),
                ..base()
            });
        }
    }

    rows
}

/// Write history records to a CSV file, replacing any previous export
///
/// The file is always rewritten in full with a header row, via a temp file in
/// the same directory that is synced and then renamed over the target.
/// Returns the number of rows written.
pub fn export_csv(records: &[HistoryRecord], csv_path: &Path) -> Result<usize> {
    let parent = csv_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(temp.as_file());

    let mut count = 0;
    for record in records {
        for row in rows_for(record) {
            writer.serialize(row)?;
            count += 1;
        }
    }

    // An empty export still gets a header row
    if count == 0 {
        writer.write_record(CSV_HEADERS)?;
    }

    writer.flush()?;
    drop(writer);
    temp.as_file().sync_all()?;
    temp.persist(csv_path).map_err(|e| Error::Io(e.error))?;

    tracing::info!(
        "Exported {} rows from {} sessions to {:?}",
        count,
        records.len(),
        csv_path
    );
    Ok(count)
}
