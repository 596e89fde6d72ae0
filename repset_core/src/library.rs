//! Saved workout definitions.

use crate::store::{load_document, save_document, update_document};
use crate::{Error, Exercise, Result, Workout};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// All workouts the user has built
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorkoutLibrary {
    #[serde(default)]
    pub workouts: Vec<Workout>,
}

fn validate(name: &str, exercises: &[Exercise]) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("workout name cannot be empty".into()));
    }
    if exercises.is_empty() {
        return Err(Error::Validation(format!(
            "workout '{}' needs at least one exercise",
            name
        )));
    }
    Ok(name.to_string())
}

impl WorkoutLibrary {
    pub fn load(path: &Path) -> Result<Self> {
        load_document(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_document(self, path)
    }

    /// Load, modify, and save back
    pub fn update<R, F>(path: &Path, f: F) -> Result<(Self, R)>
    where
        F: FnOnce(&mut WorkoutLibrary) -> Result<R>,
    {
        update_document(path, f)
    }

    pub fn add(&mut self, name: &str, exercises: Vec<Exercise>) -> Result<Workout> {
        let name = validate(name, &exercises)?;
        let workout = Workout {
            id: Uuid::new_v4(),
            name,
            exercises,
            created_at: Utc::now(),
        };
        self.workouts.push(workout.clone());
        tracing::info!("Added workout '{}' ({})", workout.name, workout.id);
        Ok(workout)
    }

    /// Replace a workout's name and exercises, keeping its id and creation time
    pub fn update_workout(
        &mut self,
        id: Uuid,
        name: &str,
        exercises: Vec<Exercise>,
    ) -> Result<&Workout> {
        let name = validate(name, &exercises)?;
        let workout = self
            .workouts
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| Error::NotFound(format!("workout {}", id)))?;

        workout.name = name;
        workout.exercises = exercises;
        Ok(&*workout)
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.workouts.len();
        self.workouts.retain(|w| w.id != id);
        self.workouts.len() != before
    }

    pub fn get(&self, id: Uuid) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    /// Look a workout up by full id, unique id prefix, or name (case-insensitive)
    pub fn find(&self, query: &str) -> Result<&Workout> {
        let query = query.trim();
        if let Ok(id) = Uuid::parse_str(query) {
            if let Some(workout) = self.get(id) {
                return Ok(workout);
            }
        }

        let by_prefix: Vec<&Workout> = self
            .workouts
            .iter()
            .filter(|w| !query.is_empty() && w.id.to_string().starts_with(query))
            .collect();
        match by_prefix.as_slice() {
            [only] => return Ok(*only),
            [] => {}
            _ => {
                return Err(Error::Validation(format!(
                    "'{}' matches {} workouts; use a longer id",
                    query,
                    by_prefix.len()
                )))
            }
        }

        self.workouts
            .iter()
            .find(|w| w.name.eq_ignore_ascii_case(query))
            .ok_or_else(|| Error::NotFound(format!("workout '{}'", query)))
    }
}

/// Parse `name:reps:sets[:bw]` into an exercise
pub fn parse_exercise_spec(spec: &str) -> Result<Exercise> {
    let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
    let invalid = || Error::Validation(format!("expected name:reps:sets[:bw], got '{}'", spec));

    let (name, reps, sets, flag) = match parts.as_slice() {
        [name, reps, sets] => (*name, *reps, *sets, None),
        [name, reps, sets, flag] => (*name, *reps, *sets, Some(*flag)),
        _ => return Err(invalid()),
    };

    let reps: u32 = reps.parse().map_err(|_| invalid())?;
    let sets: u32 = sets.parse().map_err(|_| invalid())?;
    let is_bodyweight = match flag {
        None => false,
        Some(f) if f.eq_ignore_ascii_case("bw") || f.eq_ignore_ascii_case("bodyweight") => true,
        Some(_) => return Err(invalid()),
    };

    Exercise::new(name, reps, sets, is_bodyweight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercises() -> Vec<Exercise> {
        vec![
            Exercise::new("Squat", 5, 5, false).unwrap(),
            Exercise::new("Plank", 30, 3, true).unwrap(),
        ]
    }

    #[test]
    fn test_add_validates() {
        let mut library = WorkoutLibrary::default();
        assert!(library.add("  ", exercises()).is_err());
        assert!(library.add("Legs", vec![]).is_err());

        let workout = library.add(" Legs ", exercises()).unwrap();
        assert_eq!(workout.name, "Legs");
        assert_eq!(library.workouts.len(), 1);
    }

    #[test]
    fn test_update_keeps_identity() {
        let mut library = WorkoutLibrary::default();
        let original = library.add("Legs", exercises()).unwrap();

        let updated = library
            .update_workout(original.id, "Leg Day", exercises()[..1].to_vec())
            .unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.name, "Leg Day");
        assert_eq!(updated.exercises.len(), 1);

        assert!(matches!(
            library.update_workout(Uuid::new_v4(), "X", exercises()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_remove() {
        let mut library = WorkoutLibrary::default();
        let workout = library.add("Legs", exercises()).unwrap();
        assert!(library.remove(workout.id));
        assert!(!library.remove(workout.id));
        assert!(library.workouts.is_empty());
    }

    #[test]
    fn test_find_by_id_prefix_and_name() {
        let mut library = WorkoutLibrary::default();
        let legs = library.add("Legs", exercises()).unwrap();
        library.add("Push", exercises()).unwrap();

        assert_eq!(library.find(&legs.id.to_string()).unwrap().id, legs.id);
        assert_eq!(library.find(&legs.id.to_string()[..8]).unwrap().id, legs.id);
        assert_eq!(library.find("push").unwrap().name, "Push");
        assert!(matches!(library.find("pull"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_persisted_update() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.json");

        let (_, workout) = WorkoutLibrary::update(&path, |lib| lib.add("Legs", exercises())).unwrap();

        let loaded = WorkoutLibrary::load(&path).unwrap();
        assert_eq!(loaded.get(workout.id), Some(&workout));
    }

    #[test]
    fn test_parse_exercise_spec() {
        let ex = parse_exercise_spec("Bench Press:10:3").unwrap();
        assert_eq!((ex.name.as_str(), ex.reps, ex.sets), ("Bench Press", 10, 3));
        assert!(!ex.is_bodyweight);

        let ex = parse_exercise_spec("Push-ups : 12 : 3 : bw").unwrap();
        assert!(ex.is_bodyweight);
        assert_eq!(ex.name, "Push-ups");

        assert!(parse_exercise_spec("Row:ten:3").is_err());
        assert!(parse_exercise_spec("Row:10").is_err());
        assert!(parse_exercise_spec("Row:10:3:heavy").is_err());
        assert!(parse_exercise_spec("Row:0:3").is_err());
    }
}
