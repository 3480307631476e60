//! Read side: workout trees by id, by calendar day, and most recent first.
//!
//! Every call re-reads the store. Trees are assembled with explicit sorting:
//! exercise entries ascending by `order`, sets ascending by `set_number`.

use crate::aggregate::summarize;
use crate::error::{StorageError, ValidationError};
use crate::store::{EntityStore, Tables};
use crate::{guard, Error, Result, Set, UserId, Workout, WorkoutExercise, WorkoutExerciseTree, WorkoutTree};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

/// Ownership-scoped read access to workouts
pub struct QueryEngine<'s, S> {
    store: &'s S,
    utc_offset: FixedOffset,
}

impl<'s, S: EntityStore> QueryEngine<'s, S> {
    /// Query engine whose calendar days are UTC days
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            utc_offset: Utc.fix(),
        }
    }

    /// Use `offset` as the caller's local time for day queries
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// One workout tree, if it exists and belongs to `user`
    pub fn get_by_id(&self, workout_id: Uuid, user: &UserId) -> Result<WorkoutTree> {
        self.store.read(|tables| {
            let workout = guard::owned_workout(tables, workout_id, user)?;
            load_tree(tables, workout)
        })
    }

    /// Workouts started during the caller-local calendar day `date`
    pub fn get_by_date(&self, user: &UserId, date: NaiveDate) -> Result<Vec<WorkoutTree>> {
        self.get_by_date_in(user, date, self.utc_offset)
    }

    /// Workouts started during calendar day `date` at `offset`, newest first
    pub fn get_by_date_in(
        &self,
        user: &UserId,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> Result<Vec<WorkoutTree>> {
        let (start, end) = day_bounds(date, offset)?;
        tracing::debug!("Loading workouts for {} in [{}, {})", user, start, end);

        self.store.read(|tables| {
            let mut workouts: Vec<&Workout> = guard::workouts_of(tables, user)
                .filter(|w| w.started_at >= start && w.started_at < end)
                .collect();
            workouts.sort_by(|a, b| newest_first(a, b));

            workouts.into_iter().map(|w| load_tree(tables, w)).collect()
        })
    }

    /// All of `user`'s workouts, newest first, optionally capped at `limit`
    pub fn list_recent(&self, user: &UserId, limit: Option<usize>) -> Result<Vec<WorkoutTree>> {
        self.store.read(|tables| {
            let mut workouts: Vec<&Workout> = guard::workouts_of(tables, user).collect();
            workouts.sort_by(|a, b| newest_first(a, b));
            if let Some(limit) = limit {
                workouts.truncate(limit);
            }

            workouts.into_iter().map(|w| load_tree(tables, w)).collect()
        })
    }

    /// One exercise entry with its sets, if its workout belongs to `user`
    pub fn get_workout_exercise(&self, id: Uuid, user: &UserId) -> Result<WorkoutExerciseTree> {
        self.store.read(|tables| {
            let entry = guard::owned_workout_exercise(tables, id, user)?;
            load_entry(tables, entry)
        })
    }

    /// One set, if its workout belongs to `user`
    pub fn get_set(&self, id: Uuid, user: &UserId) -> Result<Set> {
        self.store
            .read(|tables| guard::owned_set(tables, id, user).cloned())
    }
}

/// Half-open UTC interval covering calendar day `date` at `offset`
pub fn day_bounds(date: NaiveDate, offset: FixedOffset) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let next = date
        .succ_opt()
        .ok_or_else(|| ValidationError::new("date", "date is out of range"))?;

    let start = start_of_day(date, offset)?;
    let end = start_of_day(next, offset)?;
    Ok((start, end))
}

fn start_of_day(date: NaiveDate, offset: FixedOffset) -> Result<DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ValidationError::new("date", "date is out of range"))?;
    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ValidationError::new("date", "date is out of range").into())
}

/// Descending by start time; ties by creation time then id so listings are stable
fn newest_first(a: &Workout, b: &Workout) -> Ordering {
    b.started_at
        .cmp(&a.started_at)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Materialize `workout` with its ordered descendants and summary
pub(crate) fn load_tree(tables: &Tables, workout: &Workout) -> Result<WorkoutTree> {
    let mut entries: Vec<&WorkoutExercise> = tables.entries_of(workout.id).collect();
    entries.sort_by_key(|we| we.order);

    let exercises = entries
        .into_iter()
        .map(|we| load_entry(tables, we))
        .collect::<Result<Vec<_>>>()?;
    let summary = summarize(&exercises);

    Ok(WorkoutTree {
        workout: workout.clone(),
        exercises,
        summary,
    })
}

pub(crate) fn load_entry(tables: &Tables, entry: &WorkoutExercise) -> Result<WorkoutExerciseTree> {
    let exercise = tables.exercise(entry.exercise_id).ok_or_else(|| {
        Error::Storage(StorageError::Integrity(format!(
            "workout exercise {} references missing exercise {}",
            entry.id, entry.exercise_id
        )))
    })?;

    let mut sets: Vec<Set> = tables.sets_of(entry.id).cloned().collect();
    sets.sort_by_key(|s| s.set_number);

    Ok(WorkoutExerciseTree {
        entry: entry.clone(),
        exercise: exercise.clone(),
        sets,
    })
}
