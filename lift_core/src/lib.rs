#![forbid(unsafe_code)]

//! Core data access and aggregation layer for Liftlog.
//!
//! This crate provides:
//! - Domain types (exercises, workouts, workout exercises, sets)
//! - Entity store backends (JSON file, in-memory)
//! - Ownership scoping for every read and write
//! - Workout queries (by id, by day, most recent first)
//! - Workout mutations with input validation
//! - Per-workout summary statistics

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod guard;
pub mod catalog;
pub mod aggregate;
pub mod query;
pub mod mutation;

// Re-export commonly used types
pub use error::{Error, Result, StorageError, ValidationError};
pub use types::*;
pub use config::Config;
pub use store::{DeleteReport, EntityStore, FileStore, MemoryStore, Tables};
pub use catalog::{Catalog, NewExercise};
pub use aggregate::{summarize, ExerciseSummary, SetLine, WorkoutSummary};
pub use query::{day_bounds, QueryEngine};
pub use mutation::{AddExercise, AddSet, CreateWorkout, MutationService, UpdateWorkout};
