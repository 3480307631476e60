//! Write side: creating and updating workouts, and appending their children.
//!
//! Input arrives as raw caller fields and is validated before the store is
//! touched. Every change runs inside one [`EntityStore::write`] together with
//! the ownership check that guards it. Concurrent updates of the same workout
//! are last-write-wins; there is no version check.

use crate::config::ValidationConfig;
use crate::error::ValidationError;
use crate::query::{load_entry, load_tree};
use crate::store::{DeleteReport, EntityStore};
use crate::{guard, Error, Result, Set, UserId, Workout, WorkoutExercise, WorkoutExerciseTree, WorkoutTree};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

// ============================================================================
// Caller Input
// ============================================================================

/// Fields for starting a new workout
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateWorkout {
    /// RFC 3339 timestamp
    pub started_at: String,
    pub notes: Option<String>,
}

/// Partial workout update; `None` leaves a field untouched.
///
/// An empty or blank `notes` string clears the notes.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateWorkout {
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub duration_seconds: Option<i64>,
    pub notes: Option<String>,
}

/// Fields for appending an exercise to a workout
#[derive(Clone, Debug, Deserialize)]
pub struct AddExercise {
    pub exercise_id: Uuid,
    /// Defaults to one past the highest position in use
    pub order: Option<i32>,
    pub notes: Option<String>,
}

/// Fields for appending a set to a workout exercise
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AddSet {
    /// Defaults to one past the highest set number in use
    pub set_number: Option<i32>,
    pub reps: u32,
    pub weight: f64,
    pub rpe: Option<f64>,
    pub reps_in_reserve: Option<u32>,
    #[serde(default)]
    pub is_warmup: bool,
    #[serde(default)]
    pub is_drop_set: bool,
    pub notes: Option<String>,
}

/// Validated form of [`UpdateWorkout`]
#[derive(Debug, Default)]
struct WorkoutChanges {
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    duration_seconds: Option<u32>,
    notes: Option<Option<String>>,
}

// ============================================================================
// Service
// ============================================================================

/// Ownership-scoped write access to workouts
pub struct MutationService<'s, S> {
    store: &'s S,
    limits: ValidationConfig,
}

impl<'s, S: EntityStore> MutationService<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            limits: ValidationConfig::default(),
        }
    }

    pub fn with_limits(mut self, limits: ValidationConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Start a new, empty workout owned by `user`
    pub fn create_workout(&self, user: &UserId, input: CreateWorkout) -> Result<WorkoutTree> {
        let started_at = parse_timestamp("started_at", &input.started_at)?;
        let notes = self.normalize_notes("notes", input.notes)?;

        let now = Utc::now();
        let workout = Workout {
            id: Uuid::new_v4(),
            user_id: user.clone(),
            started_at,
            completed_at: None,
            duration_seconds: None,
            notes,
            created_at: now,
            updated_at: now,
        };
        let id = workout.id;

        let tree = self.store.write(|tables| {
            tables.insert_workout(workout)?;
            let workout = guard::owned_workout(tables, id, user)?;
            load_tree(tables, workout)
        })?;

        tracing::info!("Created workout {} for {}", id, user);
        Ok(tree)
    }

    /// Apply the supplied fields to workout `workout_id` if `user` owns it
    pub fn update_workout(
        &self,
        workout_id: Uuid,
        user: &UserId,
        input: UpdateWorkout,
    ) -> Result<WorkoutTree> {
        let changes = self.validate_update(input)?;

        let tree = self.store.write(|tables| {
            let workout = guard::owned_workout_mut(tables, workout_id, user)?;

            // Cross-field check against the stored row, before anything changes
            let started_at = changes.started_at.unwrap_or(workout.started_at);
            if let Some(completed_at) = changes.completed_at.or(workout.completed_at) {
                if completed_at < started_at {
                    let field = if changes.completed_at.is_some() {
                        "completed_at"
                    } else {
                        "started_at"
                    };
                    return Err(ValidationError::new(
                        field,
                        "completion time is before the start time",
                    )
                    .into());
                }
            }

            if let Some(started_at) = changes.started_at {
                workout.started_at = started_at;
            }
            if let Some(completed_at) = changes.completed_at {
                workout.completed_at = Some(completed_at);
            }
            if let Some(duration) = changes.duration_seconds {
                workout.duration_seconds = Some(duration);
            }
            if let Some(notes) = changes.notes {
                workout.notes = notes;
            }
            workout.updated_at = Utc::now();

            let workout = guard::owned_workout(tables, workout_id, user)?;
            load_tree(tables, workout)
        })?;

        tracing::info!("Updated workout {} for {}", workout_id, user);
        Ok(tree)
    }

    /// Delete workout `workout_id` and everything beneath it if `user` owns it
    pub fn delete_workout(&self, workout_id: Uuid, user: &UserId) -> Result<DeleteReport> {
        let report = self.store.write(|tables| {
            guard::owned_workout(tables, workout_id, user)?;
            tables
                .delete_workout(workout_id)
                .ok_or_else(|| Error::not_found("workout", workout_id))
        })?;

        tracing::info!(
            "Deleted workout {} ({} exercises, {} sets)",
            workout_id,
            report.workout_exercises,
            report.sets
        );
        Ok(report)
    }

    /// Append an exercise entry to workout `workout_id`
    pub fn add_exercise(
        &self,
        workout_id: Uuid,
        user: &UserId,
        input: AddExercise,
    ) -> Result<WorkoutExerciseTree> {
        let notes = self.normalize_notes("notes", input.notes)?;

        let tree = self.store.write(|tables| {
            guard::owned_workout(tables, workout_id, user)?;
            guard::usable_exercise(tables, input.exercise_id, user)?;

            let order = match input.order {
                Some(order) => order,
                None => tables.next_order(workout_id)?,
            };
            let entry = WorkoutExercise {
                id: Uuid::new_v4(),
                workout_id,
                exercise_id: input.exercise_id,
                order,
                notes,
            };
            let entry_id = entry.id;
            tables.insert_workout_exercise(entry)?;
            guard::owned_workout_mut(tables, workout_id, user)?.updated_at = Utc::now();

            let entry = guard::owned_workout_exercise(tables, entry_id, user)?;
            load_entry(tables, entry)
        })?;

        tracing::debug!(
            "Added exercise {} to workout {} at position {}",
            tree.exercise.name,
            workout_id,
            tree.entry.order
        );
        Ok(tree)
    }

    /// Append a set to workout exercise `workout_exercise_id`
    pub fn add_set(
        &self,
        workout_exercise_id: Uuid,
        user: &UserId,
        input: AddSet,
    ) -> Result<Set> {
        validate_weight(input.weight)?;
        if let Some(rpe) = input.rpe {
            validate_rpe(rpe)?;
        }
        let notes = self.normalize_notes("notes", input.notes)?;

        let set = self.store.write(|tables| {
            let workout_id = guard::owned_workout_exercise(tables, workout_exercise_id, user)?
                .workout_id;

            let set_number = match input.set_number {
                Some(number) => number,
                None => tables.next_set_number(workout_exercise_id)?,
            };
            let set = Set {
                id: Uuid::new_v4(),
                workout_exercise_id,
                set_number,
                reps: input.reps,
                weight: input.weight,
                rpe: input.rpe,
                reps_in_reserve: input.reps_in_reserve,
                is_warmup: input.is_warmup,
                is_drop_set: input.is_drop_set,
                notes,
            };
            tables.insert_set(set.clone())?;
            guard::owned_workout_mut(tables, workout_id, user)?.updated_at = Utc::now();
            Ok(set)
        })?;

        tracing::debug!("Added set {} to {}", set, workout_exercise_id);
        Ok(set)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    fn validate_update(&self, input: UpdateWorkout) -> Result<WorkoutChanges> {
        let started_at = input
            .started_at
            .as_deref()
            .map(|raw| parse_timestamp("started_at", raw))
            .transpose()?;
        let completed_at = input
            .completed_at
            .as_deref()
            .map(|raw| parse_timestamp("completed_at", raw))
            .transpose()?;

        if let (Some(start), Some(end)) = (started_at, completed_at) {
            if end < start {
                return Err(ValidationError::new(
                    "completed_at",
                    "completion time is before the start time",
                )
                .into());
            }
        }

        let duration_seconds = input
            .duration_seconds
            .map(|secs| {
                if secs <= 0 {
                    return Err(ValidationError::new("duration_seconds", "must be positive"));
                }
                u32::try_from(secs)
                    .map_err(|_| ValidationError::new("duration_seconds", "is too large"))
            })
            .transpose()?;

        let notes = match input.notes {
            Some(raw) => Some(self.normalize_notes("notes", Some(raw))?),
            None => None,
        };

        Ok(WorkoutChanges {
            started_at,
            completed_at,
            duration_seconds,
            notes,
        })
    }

    /// Trim notes, drop blank ones, enforce the length cap
    fn normalize_notes(
        &self,
        field: &'static str,
        notes: Option<String>,
    ) -> std::result::Result<Option<String>, ValidationError> {
        let Some(raw) = notes else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let len = trimmed.chars().count();
        if len > self.limits.max_notes_chars {
            return Err(ValidationError::new(
                field,
                format!(
                    "{} characters exceeds the limit of {}",
                    len, self.limits.max_notes_chars
                ),
            ));
        }
        Ok(Some(trimmed.to_string()))
    }
}

fn parse_timestamp(
    field: &'static str,
    raw: &str,
) -> std::result::Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ValidationError::new(field, format!("invalid timestamp {:?}: {}", raw, e)))
}

fn validate_weight(weight: f64) -> std::result::Result<(), ValidationError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(ValidationError::new("weight", "must be a non-negative number"));
    }
    Ok(())
}

fn validate_rpe(rpe: f64) -> std::result::Result<(), ValidationError> {
    if !(1.0..=10.0).contains(&rpe) {
        return Err(ValidationError::new("rpe", "must be between 1 and 10"));
    }
    Ok(())
}
