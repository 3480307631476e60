//! Per-workout display statistics.
//!
//! Everything here is computed from an already loaded tree; nothing touches
//! the store.

use crate::{Set, WorkoutExerciseTree};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Working-set line shown in listing views, e.g. `8/8/6 @ 80`
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SetLine {
    /// Reps of each working set, in set order
    pub reps: Vec<u32>,
    /// Weight of the first working set
    pub weight: f64,
}

impl fmt::Display for SetLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reps: Vec<String> = self.reps.iter().map(|r| r.to_string()).collect();
        write!(f, "{} @ {}", reps.join("/"), self.weight)
    }
}

/// Statistics for one exercise entry of a workout
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ExerciseSummary {
    pub workout_exercise_id: Uuid,
    pub exercise_name: String,
    pub total_sets: usize,
    pub working_sets: usize,
    pub warmup_sets: usize,
    /// `None` when every set was a warmup
    pub line: Option<SetLine>,
}

impl fmt::Display for ExerciseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.line {
            Some(line) => write!(f, "{}: {}", self.exercise_name, line),
            None if self.warmup_sets > 0 => {
                write!(f, "{}: {} warmup sets", self.exercise_name, self.warmup_sets)
            }
            None => write!(f, "{}: no sets", self.exercise_name),
        }
    }
}

/// Statistics for a whole workout
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct WorkoutSummary {
    pub exercise_count: usize,
    pub total_sets: usize,
    pub working_sets: usize,
    pub warmup_sets: usize,
    /// In exercise display order
    pub exercises: Vec<ExerciseSummary>,
}

/// Summarize the exercises of a loaded workout.
///
/// `exercises` is expected in display order with sets sorted by set number;
/// the summary follows whatever order it is given.
pub fn summarize(exercises: &[WorkoutExerciseTree]) -> WorkoutSummary {
    let per_exercise: Vec<ExerciseSummary> = exercises.iter().map(summarize_exercise).collect();

    WorkoutSummary {
        exercise_count: per_exercise.len(),
        total_sets: per_exercise.iter().map(|e| e.total_sets).sum(),
        working_sets: per_exercise.iter().map(|e| e.working_sets).sum(),
        warmup_sets: per_exercise.iter().map(|e| e.warmup_sets).sum(),
        exercises: per_exercise,
    }
}

fn summarize_exercise(tree: &WorkoutExerciseTree) -> ExerciseSummary {
    let (warmup, working): (Vec<&Set>, Vec<&Set>) = tree.sets.iter().partition(|s| s.is_warmup);

    let line = working.first().map(|first| SetLine {
        reps: working.iter().map(|s| s.reps).collect(),
        weight: first.weight,
    });

    ExerciseSummary {
        workout_exercise_id: tree.entry.id,
        exercise_name: tree.exercise.name.clone(),
        total_sets: tree.sets.len(),
        working_sets: working.len(),
        warmup_sets: warmup.len(),
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::*;
    use crate::ExerciseOwner;

    fn tree(name: &str, sets: Vec<Set>) -> WorkoutExerciseTree {
        let ex = exercise(name, ExerciseOwner::Shared);
        let we = entry(Uuid::new_v4(), ex.id, 1);
        WorkoutExerciseTree {
            entry: we,
            exercise: ex,
            sets,
        }
    }

    fn warmup(number: i32, reps: u32, weight: f64) -> Set {
        Set {
            is_warmup: true,
            ..set(Uuid::new_v4(), number, reps, weight)
        }
    }

    #[test]
    fn test_empty_workout_reports_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary, WorkoutSummary::default());
        assert_eq!(summary.exercise_count, 0);
        assert_eq!(summary.total_sets, 0);
    }

    #[test]
    fn test_all_warmup_exercise_has_no_line() {
        let summary = summarize(&[tree(
            "Bench Press",
            vec![warmup(1, 10, 20.0), warmup(2, 5, 40.0)],
        )]);

        assert_eq!(summary.exercise_count, 1);
        assert_eq!(summary.total_sets, 2);
        assert_eq!(summary.working_sets, 0);
        assert_eq!(summary.warmup_sets, 2);
        assert!(summary.exercises[0].line.is_none());
        assert_eq!(summary.exercises[0].to_string(), "Bench Press: 2 warmup sets");
    }

    #[test]
    fn test_line_uses_first_working_set_weight() {
        let we_id = Uuid::new_v4();
        let summary = summarize(&[tree(
            "Squat",
            vec![
                warmup(1, 5, 60.0),
                set(we_id, 2, 8, 100.0),
                set(we_id, 3, 8, 102.5),
                set(we_id, 4, 6, 102.5),
            ],
        )]);

        let line = summary.exercises[0].line.as_ref().unwrap();
        assert_eq!(line.reps, vec![8, 8, 6]);
        assert_eq!(line.weight, 100.0);
        assert_eq!(summary.exercises[0].to_string(), "Squat: 8/8/6 @ 100");
        assert_eq!(summary.total_sets, 4);
        assert_eq!(summary.working_sets, 3);
    }

    #[test]
    fn test_totals_span_exercises() {
        let we_id = Uuid::new_v4();
        let summary = summarize(&[
            tree("Squat", vec![set(we_id, 1, 5, 100.0), warmup(2, 5, 50.0)]),
            tree("Row", vec![set(we_id, 1, 10, 60.0)]),
            tree("Curl", vec![]),
        ]);

        assert_eq!(summary.exercise_count, 3);
        assert_eq!(summary.total_sets, 3);
        assert_eq!(summary.working_sets, 2);
        assert_eq!(summary.warmup_sets, 1);
        assert!(summary.exercises[2].line.is_none());
    }
}
