//! Workout session state machine.
//!
//! A session walks a workout's exercises in order. For the current exercise
//! it keeps one [`TrackedSet`] per target set; finishing or skipping moves to
//! the next exercise, and leaving the last exercise emits a single
//! [`HistoryRecord`] to the history sink and returns the engine to idle.

use crate::history::HistorySink;
use crate::{
    CompletedExerciseRecord, Error, Exercise, HistoryRecord, Result, SetField, TrackedSet, Weight,
    Workout,
};
use chrono::{DateTime, Utc};

/// Engine state
#[derive(Clone, Debug, Default)]
pub enum SessionState {
    #[default]
    Idle,
    InProgress(ActiveSession),
}

/// Everything the engine holds while a workout is being performed
#[derive(Clone, Debug)]
pub struct ActiveSession {
    pub workout: Workout,
    pub exercise_index: usize,
    pub completed_exercises: Vec<CompletedExerciseRecord>,
    pub tracked_sets: Vec<TrackedSet>,
    pub started_at: DateTime<Utc>,
}

impl ActiveSession {
    pub fn current_exercise(&self) -> &Exercise {
        &self.workout.exercises[self.exercise_index]
    }

    pub fn is_last_exercise(&self) -> bool {
        self.exercise_index + 1 == self.workout.exercises.len()
    }

    /// Percentage of the workout reached, counting the current exercise
    pub fn progress_percent(&self) -> f64 {
        100.0 * (self.exercise_index + 1) as f64 / self.workout.exercises.len() as f64
    }

    fn tracked_set_mut(&mut self, set_index: usize) -> Result<&mut TrackedSet> {
        let len = self.tracked_sets.len();
        self.tracked_sets
            .get_mut(set_index)
            .ok_or(Error::SetIndexOutOfRange {
                index: set_index,
                len,
            })
    }
}

/// What happened after finishing or skipping an exercise
#[derive(Clone, Debug, PartialEq)]
pub enum SessionStep {
    /// Moved on to the exercise at this index
    Advanced { exercise_index: usize },
    /// The workout is over; this record was handed to the sink
    Completed(HistoryRecord),
}

/// Fresh tracking rows for an exercise
///
/// One row per target set, pre-filled with the target reps. Bodyweight
/// exercises start with the bodyweight marker; others start unset.
pub fn initialize_sets_for_exercise(exercise: &Exercise) -> Vec<TrackedSet> {
    let weight = if exercise.is_bodyweight {
        Weight::Bodyweight
    } else {
        Weight::Unset
    };

    (1..=exercise.sets)
        .map(|set_number| TrackedSet {
            set_number,
            reps: exercise.reps,
            weight,
            completed: false,
        })
        .collect()
}

/// Drives one workout session at a time
#[derive(Clone, Debug, Default)]
pub struct SessionEngine {
    state: SessionState,
}

impl SessionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        match &self.state {
            SessionState::InProgress(session) => Some(session),
            SessionState::Idle => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.active().map(ActiveSession::current_exercise)
    }

    pub fn tracked_sets(&self) -> &[TrackedSet] {
        self.active()
            .map(|s| s.tracked_sets.as_slice())
            .unwrap_or(&[])
    }

    pub fn progress_percent(&self) -> Option<f64> {
        self.active().map(ActiveSession::progress_percent)
    }

    /// Start a session now
    pub fn start_session(&mut self, workout: Workout) -> Result<()> {
        self.start_session_at(workout, Utc::now())
    }

    /// Start a session with an explicit start time
    ///
    /// Any session already in progress is discarded without writing history.
    pub fn start_session_at(&mut self, workout: Workout, now: DateTime<Utc>) -> Result<()> {
        let first = workout
            .exercises
            .first()
            .ok_or_else(|| Error::EmptyWorkout(workout.name.clone()))?;

        if let SessionState::InProgress(previous) = &self.state {
            tracing::warn!(
                "Discarding unfinished session for '{}'",
                previous.workout.name
            );
        }

        let tracked_sets = initialize_sets_for_exercise(first);
        tracing::info!(
            "Started session for '{}' ({} exercises)",
            workout.name,
            workout.exercises.len()
        );

        self.state = SessionState::InProgress(ActiveSession {
            workout,
            exercise_index: 0,
            completed_exercises: Vec::new(),
            tracked_sets,
            started_at: now,
        });
        Ok(())
    }

    /// Drop the current session without recording it
    pub fn abandon(&mut self) -> Option<ActiveSession> {
        match std::mem::take(&mut self.state) {
            SessionState::InProgress(session) => {
                tracing::info!("Abandoned session for '{}'", session.workout.name);
                Some(session)
            }
            SessionState::Idle => None,
        }
    }

    /// Flip the completion flag of one set
    ///
    /// Completing a set of a bodyweight exercise forces its weight to the
    /// bodyweight marker; un-completing leaves the weight alone.
    pub fn toggle_set_completed(&mut self, set_index: usize) -> Result<bool> {
        let session = self.active_mut()?;
        let is_bodyweight = session.current_exercise().is_bodyweight;
        let set = session.tracked_set_mut(set_index)?;

        set.completed = !set.completed;
        if set.completed && is_bodyweight {
            set.weight = Weight::Bodyweight;
        }

        tracing::debug!("Set {} completed={}", set.set_number, set.completed);
        Ok(set.completed)
    }

    /// Overwrite reps or weight on one set
    pub fn update_set(&mut self, set_index: usize, field: SetField) -> Result<()> {
        let set = self.active_mut()?.tracked_set_mut(set_index)?;
        match field {
            SetField::Reps(reps) => set.reps = reps,
            SetField::Weight(weight) => set.weight = weight,
        }
        Ok(())
    }

    /// Record the current exercise from its tracked sets and move on
    pub fn finish_exercise(&mut self, sink: &mut dyn HistorySink) -> Result<SessionStep> {
        self.finish_exercise_at(sink, Utc::now())
    }

    pub fn finish_exercise_at(
        &mut self,
        sink: &mut dyn HistorySink,
        now: DateTime<Utc>,
    ) -> Result<SessionStep> {
        let session = self.active_mut()?;
        let record =
            CompletedExerciseRecord::finished(session.current_exercise(), &session.tracked_sets);
        self.advance(record, sink, now)
    }

    /// Record the current exercise as skipped and move on
    ///
    /// Any tracked data for the exercise is discarded.
    pub fn skip_exercise(&mut self, sink: &mut dyn HistorySink) -> Result<SessionStep> {
        self.skip_exercise_at(sink, Utc::now())
    }

    pub fn skip_exercise_at(
        &mut self,
        sink: &mut dyn HistorySink,
        now: DateTime<Utc>,
    ) -> Result<SessionStep> {
        let session = self.active_mut()?;
        let record = CompletedExerciseRecord::skipped(session.current_exercise());
        self.advance(record, sink, now)
    }

    fn active_mut(&mut self) -> Result<&mut ActiveSession> {
        match &mut self.state {
            SessionState::InProgress(session) => Ok(session),
            SessionState::Idle => Err(Error::NoActiveSession),
        }
    }

    // State is only touched once the sink has accepted the record, so a failed
    // append leaves the session on its final exercise.
    fn advance(
        &mut self,
        record: CompletedExerciseRecord,
        sink: &mut dyn HistorySink,
        now: DateTime<Utc>,
    ) -> Result<SessionStep> {
        let session = self.active_mut()?;

        if session.is_last_exercise() {
            let mut exercises = session.completed_exercises.clone();
            exercises.push(record);
            let history =
                HistoryRecord::assemble(&session.workout, Some(session.started_at), now, exercises);

            sink.append(&history)?;
            tracing::info!(
                "Completed '{}' in {}s",
                history.workout_name,
                history.duration
            );

            self.state = SessionState::Idle;
            return Ok(SessionStep::Completed(history));
        }

        session.completed_exercises.push(record);
        session.exercise_index += 1;
        session.tracked_sets = initialize_sets_for_exercise(session.current_exercise());
        tracing::debug!(
            "Advanced to exercise {} of {}",
            session.exercise_index + 1,
            session.workout.exercises.len()
        );

        Ok(SessionStep::Advanced {
            exercise_index: session.exercise_index,
        })
    }
}
