//! Core domain types for repset.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercise and workout definitions
//! - Per-set tracking data captured during a session
//! - History records produced when a session ends
//! - Parsed exercise suggestions and their defaults
//! - Personal records

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Serialized form of [`Weight::Bodyweight`]
pub const BODYWEIGHT_MARKER: &str = "bodyweight";

// ============================================================================
// Workout Definitions
// ============================================================================

/// One movement with target reps/sets
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub reps: u32,
    pub sets: u32,
    #[serde(default)]
    pub is_bodyweight: bool,
}

impl Exercise {
    /// Create a validated exercise with a fresh id
    ///
    /// The name is trimmed; it must be non-empty and both targets must be positive.
    pub fn new(name: &str, reps: u32, sets: u32, is_bodyweight: bool) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("exercise name cannot be empty".into()));
        }
        if reps == 0 || sets == 0 {
            return Err(Error::Validation(format!(
                "exercise '{}' needs reps and sets greater than zero",
                name
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            reps,
            sets,
            is_bodyweight,
        })
    }
}

/// A named, ordered list of exercises
///
/// Exercise order is the order a session walks through them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    pub exercises: Vec<Exercise>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Session Tracking
// ============================================================================

/// Load recorded against a set
///
/// Serializes as a bare number, the `"bodyweight"` marker, or `""` when unset.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Weight {
    #[default]
    Unset,
    Load(f64),
    Bodyweight,
}

impl Weight {
    /// Interpret free-form user input
    ///
    /// Blank, negative, or unparseable input yields `Unset`.
    pub fn from_input(input: &str) -> Self {
        let input = input.trim();
        if input.eq_ignore_ascii_case(BODYWEIGHT_MARKER) || input.eq_ignore_ascii_case("bw") {
            return Weight::Bodyweight;
        }
        match input.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Weight::Load(v),
            _ => Weight::Unset,
        }
    }

    /// Numeric load, treating an unset weight as zero
    pub fn load_or_zero(&self) -> f64 {
        match self {
            Weight::Load(v) => *v,
            Weight::Unset | Weight::Bodyweight => 0.0,
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Unset => write!(f, "-"),
            Weight::Load(v) => write!(f, "{}", v),
            Weight::Bodyweight => write!(f, "{}", BODYWEIGHT_MARKER),
        }
    }
}

impl Serialize for Weight {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Weight::Unset => serializer.serialize_str(""),
            Weight::Load(v) => serializer.serialize_f64(*v),
            Weight::Bodyweight => serializer.serialize_str(BODYWEIGHT_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for Weight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Weight::Load(v)),
            Raw::Text(text) if text.eq_ignore_ascii_case(BODYWEIGHT_MARKER) => {
                Ok(Weight::Bodyweight)
            }
            Raw::Text(text) if text.trim().is_empty() => Ok(Weight::Unset),
            Raw::Text(text) => text
                .trim()
                .parse::<f64>()
                .map(Weight::Load)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Ephemeral per-set data for the exercise currently being tracked
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrackedSet {
    /// 1-based, sequential
    pub set_number: u32,
    pub reps: u32,
    pub weight: Weight,
    pub completed: bool,
}

/// A field update applied to one tracked set
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SetField {
    Reps(u32),
    Weight(Weight),
}

/// One set as stored in history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletedSet {
    pub set_number: u32,
    pub reps: u32,
    pub weight: Weight,
    pub completed: bool,
}

/// Outcome of one exercise within a session
///
/// `sets` is empty when the exercise was skipped.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletedExerciseRecord {
    pub exercise_id: Uuid,
    pub exercise_name: String,
    pub target_reps: u32,
    pub target_sets: u32,
    pub sets: Vec<CompletedSet>,
}

impl CompletedExerciseRecord {
    /// Record for a finished exercise, projecting each tracked set
    ///
    /// Incomplete sets collapse to zero reps and zero load. Completed sets keep
    /// their tracked values, with the load forced to bodyweight for bodyweight
    /// exercises.
    pub fn finished(exercise: &Exercise, tracked: &[TrackedSet]) -> Self {
        let sets = tracked
            .iter()
            .map(|set| {
                let (reps, weight) = if !set.completed {
                    (0, Weight::Load(0.0))
                } else if exercise.is_bodyweight {
                    (set.reps, Weight::Bodyweight)
                } else {
                    (set.reps, Weight::Load(set.weight.load_or_zero()))
                };
                CompletedSet {
                    set_number: set.set_number,
                    reps,
                    weight,
                    completed: set.completed,
                }
            })
            .collect();

        Self {
            sets,
            ..Self::skipped(exercise)
        }
    }

    /// Record for a skipped exercise (no sets)
    pub fn skipped(exercise: &Exercise) -> Self {
        Self {
            exercise_id: exercise.id,
            exercise_name: exercise.name.clone(),
            target_reps: exercise.reps,
            target_sets: exercise.sets,
            sets: Vec::new(),
        }
    }

    pub fn was_skipped(&self) -> bool {
        self.sets.is_empty()
    }

    /// Number of sets marked completed
    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }
}

/// The immutable outcome of one session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub workout_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Whole seconds between start and completion
    pub duration: u64,
    pub exercises: Vec<CompletedExerciseRecord>,
}

impl HistoryRecord {
    /// Assemble a record for a workout completed at `completed_at`
    ///
    /// A missing start time yields a zero duration and falls back to the
    /// completion time.
    pub fn assemble(
        workout: &Workout,
        started_at: Option<DateTime<Utc>>,
        completed_at: DateTime<Utc>,
        exercises: Vec<CompletedExerciseRecord>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workout_id: workout.id,
            workout_name: workout.name.clone(),
            started_at: started_at.unwrap_or(completed_at),
            completed_at,
            duration: duration_seconds(started_at, completed_at),
            exercises,
        }
    }
}

/// Whole seconds elapsed, floored, never negative; zero without a start time
pub fn duration_seconds(started_at: Option<DateTime<Utc>>, completed_at: DateTime<Utc>) -> u64 {
    match started_at {
        Some(start) => {
            let millis = (completed_at - start).num_milliseconds().max(0);
            (millis / 1000) as u64
        }
        None => 0,
    }
}

// ============================================================================
// Suggestions
// ============================================================================

/// A candidate exercise parsed from generated text, before defaulting
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suggestion {
    pub name: String,
    pub reps: Option<u32>,
    pub sets: Option<u32>,
    pub is_bodyweight: bool,
}

/// Caller-supplied targets for suggestions that lack them
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestionDefaults {
    pub reps: u32,
    pub sets: u32,
}

impl Default for SuggestionDefaults {
    fn default() -> Self {
        Self { reps: 8, sets: 3 }
    }
}

impl Suggestion {
    /// Fill in missing (or zero) reps/sets and turn the suggestion into an exercise
    pub fn into_exercise(self, defaults: SuggestionDefaults) -> Result<Exercise> {
        let reps = self.reps.filter(|r| *r > 0).unwrap_or(defaults.reps);
        let sets = self.sets.filter(|s| *s > 0).unwrap_or(defaults.sets);
        Exercise::new(&self.name, reps, sets, self.is_bodyweight)
    }
}

// ============================================================================
// Personal Records
// ============================================================================

/// A best lift the user wants to remember
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonalRecord {
    pub id: Uuid,
    pub exercise_name: String,
    pub weight: f64,
    pub reps: u32,
    pub date: DateTime<Utc>,
}
