//! Exercise catalog access.
//!
//! Provides the built-in shared exercises and the lookups workouts need to
//! reference them. Users can also keep private exercises of their own.

use crate::error::ValidationError;
use crate::store::EntityStore;
use crate::{Error, Exercise, ExerciseOwner, Result, UserId};
use serde::Deserialize;
use uuid::Uuid;

/// A built-in exercise definition
struct DefaultExercise {
    name: &'static str,
    category: &'static str,
    muscle_group: &'static str,
    equipment: &'static str,
}

const DEFAULT_EXERCISES: &[DefaultExercise] = &[
    DefaultExercise {
        name: "Back Squat",
        category: "compound",
        muscle_group: "legs",
        equipment: "barbell",
    },
    DefaultExercise {
        name: "Bench Press",
        category: "compound",
        muscle_group: "chest",
        equipment: "barbell",
    },
    DefaultExercise {
        name: "Deadlift",
        category: "compound",
        muscle_group: "posterior_chain",
        equipment: "barbell",
    },
    DefaultExercise {
        name: "Overhead Press",
        category: "compound",
        muscle_group: "shoulders",
        equipment: "barbell",
    },
    DefaultExercise {
        name: "Barbell Row",
        category: "compound",
        muscle_group: "back",
        equipment: "barbell",
    },
    DefaultExercise {
        name: "Pull-up",
        category: "compound",
        muscle_group: "back",
        equipment: "pullup_bar",
    },
    DefaultExercise {
        name: "Romanian Deadlift",
        category: "accessory",
        muscle_group: "hamstrings",
        equipment: "barbell",
    },
    DefaultExercise {
        name: "Dumbbell Curl",
        category: "isolation",
        muscle_group: "biceps",
        equipment: "dumbbell",
    },
];

/// Fields for a user's private exercise
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewExercise {
    pub name: String,
    pub category: Option<String>,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
}

/// Exercise lookups scoped to what a user may see
pub struct Catalog<'s, S> {
    store: &'s S,
}

impl<'s, S: EntityStore> Catalog<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Insert any built-in shared exercise not already present.
    ///
    /// Matching is by name, so running this repeatedly is harmless.
    /// Returns the number of exercises added.
    pub fn seed_defaults(&self) -> Result<usize> {
        let added = self.store.write(|tables| {
            let mut added = 0;
            for def in DEFAULT_EXERCISES {
                let exists = tables.exercises.iter().any(|e| {
                    e.owner == ExerciseOwner::Shared && e.name.eq_ignore_ascii_case(def.name)
                });
                if exists {
                    continue;
                }

                tables.insert_exercise(Exercise {
                    id: Uuid::new_v4(),
                    name: def.name.into(),
                    owner: ExerciseOwner::Shared,
                    category: Some(def.category.into()),
                    muscle_group: Some(def.muscle_group.into()),
                    equipment: Some(def.equipment.into()),
                    archived: false,
                })?;
                added += 1;
            }
            Ok(added)
        })?;

        if added > 0 {
            tracing::info!("Seeded {} shared exercises", added);
        }
        Ok(added)
    }

    /// Add a private exercise for `user`
    pub fn create_exercise(&self, user: &UserId, input: NewExercise) -> Result<Exercise> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::new("name", "must not be empty").into());
        }

        let exercise = Exercise {
            id: Uuid::new_v4(),
            name,
            owner: ExerciseOwner::Owned(user.clone()),
            category: input.category,
            muscle_group: input.muscle_group,
            equipment: input.equipment,
            archived: false,
        };

        self.store.write(|tables| {
            let taken = tables.exercises.iter().any(|e| {
                !e.archived
                    && e.owner.is_visible_to(user)
                    && e.name.eq_ignore_ascii_case(&exercise.name)
            });
            if taken {
                return Err(ValidationError::new(
                    "name",
                    format!("an exercise named {:?} already exists", exercise.name),
                )
                .into());
            }
            tables.insert_exercise(exercise.clone())
        })?;

        tracing::info!("Created exercise {:?} for {}", exercise.name, user);
        Ok(exercise)
    }

    /// Non-archived exercises `user` can pick, sorted by name
    pub fn visible_exercises(&self, user: &UserId) -> Result<Vec<Exercise>> {
        self.store.read(|tables| {
            let mut visible: Vec<Exercise> = tables
                .exercises
                .iter()
                .filter(|e| !e.archived && e.owner.is_visible_to(user))
                .cloned()
                .collect();
            visible.sort_by_key(|e| e.name.to_lowercase());
            Ok(visible)
        })
    }

    /// Case-insensitive lookup among visible exercises; private ones win over shared
    pub fn find_by_name(&self, user: &UserId, name: &str) -> Result<Exercise> {
        let wanted = name.trim();
        let visible = self.visible_exercises(user)?;

        visible
            .iter()
            .filter(|e| e.name.eq_ignore_ascii_case(wanted))
            .find(|e| matches!(e.owner, ExerciseOwner::Owned(_)))
            .or_else(|| visible.iter().find(|e| e.name.eq_ignore_ascii_case(wanted)))
            .cloned()
            .ok_or_else(|| Error::not_found("exercise", wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_seed_is_idempotent() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);

        assert_eq!(catalog.seed_defaults().unwrap(), DEFAULT_EXERCISES.len());
        assert_eq!(catalog.seed_defaults().unwrap(), 0);
        assert_eq!(
            catalog.visible_exercises(&UserId::new("anyone")).unwrap().len(),
            DEFAULT_EXERCISES.len()
        );
    }

    #[test]
    fn test_private_exercises_visible_to_owner_only() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);
        catalog.seed_defaults().unwrap();

        let u1 = UserId::new("u1");
        catalog
            .create_exercise(
                &u1,
                NewExercise {
                    name: "Zercher Squat".into(),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(catalog.find_by_name(&u1, "zercher squat").is_ok());
        assert!(catalog
            .find_by_name(&UserId::new("u2"), "Zercher Squat")
            .unwrap_err()
            .is_not_found());
        assert_eq!(
            catalog.visible_exercises(&u1).unwrap().len(),
            DEFAULT_EXERCISES.len() + 1
        );
    }

    #[test]
    fn test_duplicate_visible_name_rejected() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);
        catalog.seed_defaults().unwrap();

        let err = catalog
            .create_exercise(
                &UserId::new("u1"),
                NewExercise {
                    name: "bench press".into(),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref v) if v.field == "name"));
    }

    #[test]
    fn test_archived_exercise_hidden() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);
        catalog.seed_defaults().unwrap();
        let user = UserId::new("u1");

        let deadlift = catalog.find_by_name(&user, "Deadlift").unwrap();
        store
            .write(|t| {
                t.archive_exercise(deadlift.id);
                Ok(())
            })
            .unwrap();

        assert!(catalog.find_by_name(&user, "Deadlift").is_err());
    }
}
