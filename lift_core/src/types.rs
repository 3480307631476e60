//! Core domain types for the Liftlog system.
//!
//! This module defines the records kept by the entity store and the
//! materialized trees handed back to callers:
//! - Exercises and their sharing rule
//! - Workouts, workout exercises and sets
//! - Workout trees with their computed summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::aggregate::WorkoutSummary;

// ============================================================================
// Identity
// ============================================================================

/// Opaque identifier of an authenticated user.
///
/// Identity management is external; the core only compares these for equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ============================================================================
// Exercise Catalog
// ============================================================================

/// Who an exercise belongs to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum ExerciseOwner {
    /// Part of the global catalog, visible to everyone
    Shared,
    /// Private to one user
    Owned(UserId),
}

impl ExerciseOwner {
    /// Whether `user` may see and reference an exercise with this owner
    pub fn is_visible_to(&self, user: &UserId) -> bool {
        match self {
            ExerciseOwner::Shared => true,
            ExerciseOwner::Owned(owner) => owner == user,
        }
    }
}

/// A named movement that workout exercises reference
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub owner: ExerciseOwner,
    pub category: Option<String>,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

// ============================================================================
// Workout Records
// ============================================================================

/// One training session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: UserId,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One exercise performed within a workout, at a given position
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutExercise {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub exercise_id: Uuid,
    pub order: i32,
    pub notes: Option<String>,
}

/// One performed set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Set {
    pub id: Uuid,
    pub workout_exercise_id: Uuid,
    pub set_number: i32,
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

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rpe_str = self.rpe.map(|r| format!(" @{:.1}", r)).unwrap_or_default();
        let tag = if self.is_warmup {
            " (warmup)"
        } else if self.is_drop_set {
            " (drop)"
        } else {
            ""
        };

        write!(
            f,
            "#{}: {} x {} reps{}{}",
            self.set_number, self.weight, self.reps, rpe_str, tag
        )
    }
}

// ============================================================================
// Materialized Trees
// ============================================================================

/// A workout exercise with its referenced exercise and ordered sets
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WorkoutExerciseTree {
    #[serde(flatten)]
    pub entry: WorkoutExercise,
    pub exercise: Exercise,
    /// Ascending by `set_number`
    pub sets: Vec<Set>,
}

/// A workout with every descendant loaded, in display order
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WorkoutTree {
    #[serde(flatten)]
    pub workout: Workout,
    /// Ascending by `order`
    pub exercises: Vec<WorkoutExerciseTree>,
    pub summary: WorkoutSummary,
}

impl WorkoutTree {
    pub fn id(&self) -> Uuid {
        self.workout.id
    }
}
