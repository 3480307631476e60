//! Entity store for exercises, workouts, workout exercises and sets.
//!
//! Storage backends implement [`EntityStore`], which runs closures against a
//! [`Tables`] image of the four record kinds. A write closure either commits
//! as a whole or not at all, which is what makes ownership checks and the
//! changes they guard a single atomic operation.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::{StorageError, ValidationError};
use crate::{Error, Exercise, Result, Set, Workout, WorkoutExercise};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Version of the stored document layout
pub const SCHEMA_VERSION: u32 = 1;

/// Storage backend trait
pub trait EntityStore {
    /// Run `f` against the latest committed state.
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> Result<T>;

    /// Run `f` with exclusive access and commit its changes if it returns `Ok`.
    ///
    /// When `f` fails nothing is written.
    fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> Result<T>;
}

/// Counts of rows removed by a cascading workout delete
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub workout_exercises: usize,
    pub sets: usize,
}

/// All records, as stored
///
/// Row order inside each table is insertion order and carries no meaning.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Tables {
    pub schema_version: u32,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub workout_exercises: Vec<WorkoutExercise>,
    #[serde(default)]
    pub sets: Vec<Set>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            exercises: Vec::new(),
            workouts: Vec::new(),
            workout_exercises: Vec::new(),
            sets: Vec::new(),
        }
    }
}

impl Tables {
    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn exercise(&self, id: Uuid) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn workout(&self, id: Uuid) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    pub fn workout_mut(&mut self, id: Uuid) -> Option<&mut Workout> {
        self.workouts.iter_mut().find(|w| w.id == id)
    }

    pub fn workout_exercise(&self, id: Uuid) -> Option<&WorkoutExercise> {
        self.workout_exercises.iter().find(|we| we.id == id)
    }

    pub fn set(&self, id: Uuid) -> Option<&Set> {
        self.sets.iter().find(|s| s.id == id)
    }

    /// Exercise entries of a workout, in storage order
    pub fn entries_of(&self, workout_id: Uuid) -> impl Iterator<Item = &WorkoutExercise> {
        self.workout_exercises
            .iter()
            .filter(move |we| we.workout_id == workout_id)
    }

    /// Sets of a workout exercise, in storage order
    pub fn sets_of(&self, workout_exercise_id: Uuid) -> impl Iterator<Item = &Set> {
        self.sets
            .iter()
            .filter(move |s| s.workout_exercise_id == workout_exercise_id)
    }

    /// Next free `order` after the highest one in use
    pub fn next_order(&self, workout_id: Uuid) -> Result<i32> {
        let highest = self.entries_of(workout_id).map(|we| we.order).max();
        next_after("order", highest)
    }

    /// Next free `set_number` after the highest one in use
    pub fn next_set_number(&self, workout_exercise_id: Uuid) -> Result<i32> {
        let highest = self.sets_of(workout_exercise_id).map(|s| s.set_number).max();
        next_after("set_number", highest)
    }

    // ------------------------------------------------------------------
    // Exercises
    // ------------------------------------------------------------------

    pub fn insert_exercise(&mut self, exercise: Exercise) -> Result<()> {
        if self.exercise(exercise.id).is_some() {
            return Err(integrity(format!("duplicate exercise id {}", exercise.id)));
        }
        self.exercises.push(exercise);
        Ok(())
    }

    /// Mark an exercise archived. Returns false if it does not exist.
    pub fn archive_exercise(&mut self, id: Uuid) -> bool {
        match self.exercises.iter_mut().find(|e| e.id == id) {
            Some(exercise) => {
                exercise.archived = true;
                true
            }
            None => false,
        }
    }

    /// Remove an exercise that no workout references.
    pub fn delete_exercise(&mut self, id: Uuid) -> Result<Exercise> {
        let idx = self
            .exercises
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::not_found("exercise", id))?;

        let references = self
            .workout_exercises
            .iter()
            .filter(|we| we.exercise_id == id)
            .count();
        if references > 0 {
            tracing::warn!(
                "Refusing to delete exercise {} referenced by {} workout exercises",
                id,
                references
            );
            return Err(Error::Conflict(format!(
                "exercise {} is referenced by {} workout exercises",
                id, references
            )));
        }

        Ok(self.exercises.remove(idx))
    }

    // ------------------------------------------------------------------
    // Workouts and descendants
    // ------------------------------------------------------------------

    pub fn insert_workout(&mut self, workout: Workout) -> Result<()> {
        if self.workout(workout.id).is_some() {
            return Err(integrity(format!("duplicate workout id {}", workout.id)));
        }
        self.workouts.push(workout);
        Ok(())
    }

    pub fn insert_workout_exercise(&mut self, entry: WorkoutExercise) -> Result<()> {
        if self.workout(entry.workout_id).is_none() {
            return Err(integrity(format!(
                "workout exercise {} points at missing workout {}",
                entry.id, entry.workout_id
            )));
        }
        if self.exercise(entry.exercise_id).is_none() {
            return Err(integrity(format!(
                "workout exercise {} points at missing exercise {}",
                entry.id, entry.exercise_id
            )));
        }
        if self.workout_exercise(entry.id).is_some() {
            return Err(integrity(format!("duplicate workout exercise id {}", entry.id)));
        }
        if self
            .entries_of(entry.workout_id)
            .any(|we| we.order == entry.order)
        {
            return Err(ValidationError::new(
                "order",
                format!("position {} is already taken in this workout", entry.order),
            )
            .into());
        }

        self.workout_exercises.push(entry);
        Ok(())
    }

    pub fn insert_set(&mut self, set: Set) -> Result<()> {
        if self.workout_exercise(set.workout_exercise_id).is_none() {
            return Err(integrity(format!(
                "set {} points at missing workout exercise {}",
                set.id, set.workout_exercise_id
            )));
        }
        if self.set(set.id).is_some() {
            return Err(integrity(format!("duplicate set id {}", set.id)));
        }
        if self
            .sets_of(set.workout_exercise_id)
            .any(|s| s.set_number == set.set_number)
        {
            return Err(ValidationError::new(
                "set_number",
                format!("set {} already exists for this exercise", set.set_number),
            )
            .into());
        }

        self.sets.push(set);
        Ok(())
    }

    /// Remove a workout and everything beneath it.
    ///
    /// Returns `None` if the workout does not exist.
    pub fn delete_workout(&mut self, id: Uuid) -> Option<DeleteReport> {
        let idx = self.workouts.iter().position(|w| w.id == id)?;
        self.workouts.remove(idx);

        let entry_ids: Vec<Uuid> = self.entries_of(id).map(|we| we.id).collect();

        let sets_before = self.sets.len();
        self.sets
            .retain(|s| !entry_ids.contains(&s.workout_exercise_id));
        let entries_before = self.workout_exercises.len();
        self.workout_exercises.retain(|we| we.workout_id != id);

        Some(DeleteReport {
            workout_exercises: entries_before - self.workout_exercises.len(),
            sets: sets_before - self.sets.len(),
        })
    }

    /// Check the whole document against the schema rules.
    ///
    /// Used when loading from disk; a document that fails is treated as corrupt.
    pub fn check_integrity(&self) -> std::result::Result<(), String> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(format!(
                "unsupported schema version {} (expected {})",
                self.schema_version, SCHEMA_VERSION
            ));
        }

        let workout_ids: HashSet<Uuid> = self.workouts.iter().map(|w| w.id).collect();
        let exercise_ids: HashSet<Uuid> = self.exercises.iter().map(|e| e.id).collect();

        let mut entry_ids = HashSet::with_capacity(self.workout_exercises.len());
        let mut positions = HashSet::with_capacity(self.workout_exercises.len());
        for we in &self.workout_exercises {
            if !workout_ids.contains(&we.workout_id) {
                return Err(format!("workout exercise {} has no workout", we.id));
            }
            if !exercise_ids.contains(&we.exercise_id) {
                return Err(format!("workout exercise {} has no exercise", we.id));
            }
            if !positions.insert((we.workout_id, we.order)) {
                return Err(format!(
                    "workout {} has duplicate order {}",
                    we.workout_id, we.order
                ));
            }
            entry_ids.insert(we.id);
        }

        let mut numbers = HashSet::with_capacity(self.sets.len());
        for set in &self.sets {
            if !entry_ids.contains(&set.workout_exercise_id) {
                return Err(format!("set {} has no workout exercise", set.id));
            }
            if !numbers.insert((set.workout_exercise_id, set.set_number)) {
                return Err(format!(
                    "workout exercise {} has duplicate set number {}",
                    set.workout_exercise_id, set.set_number
                ));
            }
        }

        Ok(())
    }
}

fn next_after(field: &'static str, highest: Option<i32>) -> Result<i32> {
    match highest {
        None => Ok(1),
        Some(n) => n.checked_add(1).ok_or_else(|| {
            ValidationError::new(field, format!("no position left after {}", n)).into()
        }),
    }
}

fn integrity(reason: String) -> Error {
    Error::Storage(StorageError::Integrity(reason))
}
