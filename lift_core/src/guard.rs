//! Ownership scoping for every read and write.
//!
//! Each lookup matches on the record id AND the caller's user id (directly for
//! workouts, through the ancestor chain for workout exercises and sets).
//! Anything that does not match is reported as not found, so callers cannot
//! tell "absent" apart from "belongs to someone else".
//!
//! Writes must use these lookups inside [`EntityStore::write`] so the check
//! and the change commit together.
//!
//! [`EntityStore::write`]: crate::store::EntityStore::write

use crate::store::Tables;
use crate::{Error, Exercise, Result, Set, UserId, Workout, WorkoutExercise};
use uuid::Uuid;

/// Workout `id` if it belongs to `user`
pub fn owned_workout<'t>(tables: &'t Tables, id: Uuid, user: &UserId) -> Result<&'t Workout> {
    tables
        .workout(id)
        .filter(|w| &w.user_id == user)
        .ok_or_else(|| Error::not_found("workout", id))
}

/// Mutable workout `id` if it belongs to `user`
pub fn owned_workout_mut<'t>(
    tables: &'t mut Tables,
    id: Uuid,
    user: &UserId,
) -> Result<&'t mut Workout> {
    tables
        .workout_mut(id)
        .filter(|w| &w.user_id == user)
        .ok_or_else(|| Error::not_found("workout", id))
}

/// Workout exercise `id` if its workout belongs to `user`
pub fn owned_workout_exercise<'t>(
    tables: &'t Tables,
    id: Uuid,
    user: &UserId,
) -> Result<&'t WorkoutExercise> {
    tables
        .workout_exercise(id)
        .filter(|we| owned_workout(tables, we.workout_id, user).is_ok())
        .ok_or_else(|| Error::not_found("workout exercise", id))
}

/// Set `id` if its workout exercise's workout belongs to `user`
pub fn owned_set<'t>(tables: &'t Tables, id: Uuid, user: &UserId) -> Result<&'t Set> {
    tables
        .set(id)
        .filter(|s| owned_workout_exercise(tables, s.workout_exercise_id, user).is_ok())
        .ok_or_else(|| Error::not_found("set", id))
}

/// Exercise `id` if `user` may reference it in a new workout entry
///
/// Archived exercises stay readable through existing workouts but cannot be
/// picked again.
pub fn usable_exercise<'t>(tables: &'t Tables, id: Uuid, user: &UserId) -> Result<&'t Exercise> {
    tables
        .exercise(id)
        .filter(|e| e.owner.is_visible_to(user) && !e.archived)
        .ok_or_else(|| Error::not_found("exercise", id))
}

/// All workouts belonging to `user`, in storage order
pub fn workouts_of<'t>(tables: &'t Tables, user: &'t UserId) -> impl Iterator<Item = &'t Workout> {
    tables.workouts.iter().filter(move |w| &w.user_id == user)
}
