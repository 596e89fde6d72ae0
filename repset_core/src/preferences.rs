//! User preferences persisted across runs.
//!
//! Holds the numeric defaults used when a suggestion lacks reps or sets, the
//! equipment the user owns, personal records, the dark-mode flag, and when the
//! splash screen was last shown.

use crate::store::{load_document, save_document, update_document};
use crate::{Error, PersonalRecord, Result, SuggestionDefaults};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Days between splash screen showings
pub const SPLASH_COOLDOWN_DAYS: i64 = 30;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,

    #[serde(default = "default_reps")]
    pub default_reps: u32,

    #[serde(default = "default_sets")]
    pub default_sets: u32,

    #[serde(default)]
    pub equipment: Vec<String>,

    #[serde(default)]
    pub personal_records: Vec<PersonalRecord>,

    #[serde(default)]
    pub last_splash_shown: Option<DateTime<Utc>>,
}

fn default_reps() -> u32 {
    8
}

fn default_sets() -> u32 {
    3
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            default_reps: default_reps(),
            default_sets: default_sets(),
            equipment: Vec::new(),
            personal_records: Vec::new(),
            last_splash_shown: None,
        }
    }
}

fn validate_record(exercise_name: &str, weight: f64) -> Result<String> {
    let name = exercise_name.trim();
    if name.is_empty() {
        return Err(Error::Validation("exercise name cannot be empty".into()));
    }
    if !weight.is_finite() || weight < 0.0 {
        return Err(Error::Validation(format!("invalid weight {}", weight)));
    }
    Ok(name.to_string())
}

impl Preferences {
    pub fn load(path: &Path) -> Result<Self> {
        load_document(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_document(self, path)
    }

    /// Load, modify, and save back
    pub fn update<R, F>(path: &Path, f: F) -> Result<(Self, R)>
    where
        F: FnOnce(&mut Preferences) -> Result<R>,
    {
        update_document(path, f)
    }

    pub fn defaults(&self) -> SuggestionDefaults {
        SuggestionDefaults {
            reps: self.default_reps,
            sets: self.default_sets,
        }
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }

    pub fn set_default_reps(&mut self, reps: u32) -> Result<()> {
        if reps == 0 {
            return Err(Error::Validation("default reps must be positive".into()));
        }
        self.default_reps = reps;
        Ok(())
    }

    pub fn set_default_sets(&mut self, sets: u32) -> Result<()> {
        if sets == 0 {
            return Err(Error::Validation("default sets must be positive".into()));
        }
        self.default_sets = sets;
        Ok(())
    }

    /// Add equipment; blank names and duplicates are ignored
    pub fn add_equipment(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.equipment.iter().any(|e| e == name) {
            return false;
        }
        self.equipment.push(name.to_string());
        true
    }

    pub fn remove_equipment(&mut self, name: &str) -> bool {
        let name = name.trim();
        let before = self.equipment.len();
        self.equipment.retain(|e| e != name);
        self.equipment.len() != before
    }

    pub fn add_personal_record(
        &mut self,
        exercise_name: &str,
        weight: f64,
        reps: u32,
    ) -> Result<PersonalRecord> {
        let exercise_name = validate_record(exercise_name, weight)?;
        let record = PersonalRecord {
            id: Uuid::new_v4(),
            exercise_name,
            weight,
            reps,
            date: Utc::now(),
        };
        self.personal_records.push(record.clone());
        Ok(record)
    }

    pub fn update_personal_record(
        &mut self,
        id: Uuid,
        exercise_name: &str,
        weight: f64,
        reps: u32,
    ) -> Result<()> {
        let exercise_name = validate_record(exercise_name, weight)?;
        let record = self
            .personal_records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("personal record {}", id)))?;

        record.exercise_name = exercise_name;
        record.weight = weight;
        record.reps = reps;
        Ok(())
    }

    pub fn remove_personal_record(&mut self, id: Uuid) -> bool {
        let before = self.personal_records.len();
        self.personal_records.retain(|r| r.id != id);
        self.personal_records.len() != before
    }

    /// Resolve a personal record from a full id or a unique id prefix
    pub fn find_personal_record(&self, query: &str) -> Result<&PersonalRecord> {
        let query = query.trim();
        let matches: Vec<&PersonalRecord> = self
            .personal_records
            .iter()
            .filter(|r| !query.is_empty() && r.id.to_string().starts_with(query))
            .collect();

        match matches.as_slice() {
            [only] => Ok(*only),
            [] => Err(Error::NotFound(format!("personal record '{}'", query))),
            _ => Err(Error::Validation(format!(
                "'{}' matches {} personal records; use a longer id",
                query,
                matches.len()
            ))),
        }
    }

    /// Whether the splash screen is due
    pub fn should_show_splash(&self, now: DateTime<Utc>) -> bool {
        match self.last_splash_shown {
            None => true,
            Some(last) => now - last >= Duration::days(SPLASH_COOLDOWN_DAYS),
        }
    }

    pub fn mark_splash_shown(&mut self, now: DateTime<Utc>) {
        self.last_splash_shown = Some(now);
    }
}
