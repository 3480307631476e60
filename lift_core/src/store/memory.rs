//! In-process entity store.

use super::{EntityStore, Tables};
use crate::error::StorageError;
use crate::Result;
use std::sync::{Arc, Mutex};

/// Store that keeps its tables in memory; clones share the same tables.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of tables
    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }
}

impl EntityStore for MemoryStore {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> Result<T>,
    {
        let guard = self.tables.lock().map_err(|_| StorageError::Poisoned)?;
        f(&*guard)
    }

    fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> Result<T>,
    {
        let mut guard = self.tables.lock().map_err(|_| StorageError::Poisoned)?;

        // Work on a copy so a failing closure leaves no partial changes
        let mut draft = guard.clone();
        let value = f(&mut draft)?;
        *guard = draft;
        Ok(value)
    }
}
