//! JSON document store with file locking.
//!
//! All tables live in one JSON document. Readers hold a shared lock on a
//! sidecar lock file; writers hold an exclusive lock for the whole
//! load-modify-save cycle and replace the document atomically.

use super::{EntityStore, Tables};
use crate::error::StorageError;
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the store document inside a data directory
pub const STORE_FILE: &str = "liftlog.json";

/// File-backed entity store
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the document at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self { path, lock_path }
    }

    /// Create a store using the standard file name inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn open_lock_file(&self) -> Result<File> {
        self.ensure_parent_dir()?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;
        Ok(file)
    }

    /// Load the document. Caller must hold the lock.
    ///
    /// A missing document is an empty store. An unreadable one is an error:
    /// returning empty tables here would be indistinguishable from "no rows".
    fn load(&self) -> Result<Tables> {
        if !self.path.exists() {
            tracing::debug!("No store document at {:?}, starting empty", self.path);
            return Ok(Tables::default());
        }

        let mut contents = String::new();
        File::open(&self.path)?.read_to_string(&mut contents)?;

        let tables: Tables = serde_json::from_str(&contents).map_err(|e| self.corrupt(e))?;
        tables.check_integrity().map_err(|reason| self.corrupt(reason))?;

        tracing::debug!(
            "Loaded store from {:?}: {} workouts, {} exercises",
            self.path,
            tables.workouts.len(),
            tables.exercises.len()
        );
        Ok(tables)
    }

    /// Save the document. Caller must hold the exclusive lock.
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn save(&self, tables: &Tables) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
        })?;
        let temp = NamedTempFile::new_in(parent)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, tables)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(&self.path)
            .map_err(|e| Error::Storage(StorageError::Io(e.error)))?;

        tracing::debug!("Saved store to {:?}", self.path);
        Ok(())
    }

    fn corrupt(&self, reason: impl ToString) -> Error {
        tracing::warn!("Store document {:?} is unreadable", self.path);
        Error::Storage(StorageError::Corrupt {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        })
    }
}

impl EntityStore for FileStore {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> Result<T>,
    {
        let lock = self.open_lock_file()?;
        lock.lock_shared()?;

        let tables = self.load();
        lock.unlock()?;

        f(&tables?)
    }

    fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> Result<T>,
    {
        let lock = self.open_lock_file()?;
        lock.lock_exclusive()?;

        // Lock is released when `lock` is dropped, including on early return
        let mut tables = self.load()?;
        let value = f(&mut tables)?;
        self.save(&tables)?;

        lock.unlock()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::*;
    use crate::ExerciseOwner;
    use chrono::Utc;

    #[test]
    fn test_read_missing_store_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(&temp_dir.path().join("nested"));

        let count = store.read(|t| Ok(t.workouts.len())).unwrap();
        assert_eq!(count, 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(temp_dir.path());

        let w = workout("u1", Utc::now());
        let id = w.id;
        store.write(|t| t.insert_workout(w)).unwrap();

        // A fresh handle sees the committed state
        let reopened = FileStore::in_dir(temp_dir.path());
        let found = reopened.read(|t| Ok(t.workout(id).cloned())).unwrap();
        assert_eq!(found.unwrap().id, id);
    }

    #[test]
    fn test_failed_write_commits_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(temp_dir.path());

        let result: Result<()> = store.write(|t| {
            t.insert_workout(workout("u1", Utc::now()))?;
            Err(Error::Conflict("abort".into()))
        });
        assert!(result.is_err());

        let count = store.read(|t| Ok(t.workouts.len())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_corrupted_store_returns_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(temp_dir.path());

        std::fs::write(store.path(), "{ invalid json }").unwrap();

        let err = store.read(|t| Ok(t.workouts.len())).unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Corrupt { .. })));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_dangling_reference_is_corrupt() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(temp_dir.path());

        let mut tables = Tables::default();
        let squat = exercise("Squat", ExerciseOwner::Shared);
        tables
            .workout_exercises
            .push(entry(uuid::Uuid::new_v4(), squat.id, 1));
        tables.exercises.push(squat);
        std::fs::write(store.path(), serde_json::to_string(&tables).unwrap()).unwrap();

        let err = store.read(|t| Ok(t.workouts.len())).unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(temp_dir.path());

        store
            .write(|t| t.insert_workout(workout("u1", Utc::now())))
            .unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != STORE_FILE && e.file_name() != "liftlog.lock")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only the store and its lock, found extras: {:?}",
            extras
        );
    }
}
