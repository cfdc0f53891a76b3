//! # redb-backed Progress Storage
//!
//! A disk-backed key-value store using the redb embedded database.
//! One table maps a department code to its serialized progress map; every
//! save is a single write transaction, so a crash never leaves a half-written
//! payload behind.

use super::KeyValueStore;
use crate::CoursemapError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for progress: department code -> progress JSON
const PROGRESS: TableDefinition<&str, &str> = TableDefinition::new("progress");

/// A disk-backed progress store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a progress database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoursemapError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| CoursemapError::IoError(e.to_string()))?;

        // Initialize the table so read transactions never miss it
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| CoursemapError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(PROGRESS)
                .map_err(|e| CoursemapError::IoError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| CoursemapError::IoError(e.to_string()))?;
        }

        Ok(Self { db })
    }

    /// Department codes that have saved progress, ascending.
    pub fn keys(&self) -> Result<Vec<String>, CoursemapError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| CoursemapError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(PROGRESS)
            .map_err(|e| CoursemapError::IoError(e.to_string()))?;

        let mut keys = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| CoursemapError::IoError(e.to_string()))?
        {
            let (key, _) = entry.map_err(|e| CoursemapError::IoError(e.to_string()))?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoursemapError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| CoursemapError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(PROGRESS)
            .map_err(|e| CoursemapError::IoError(e.to_string()))?;
        let value = table
            .get(key)
            .map_err(|e| CoursemapError::IoError(e.to_string()))?
            .map(|v| v.value().to_string());
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CoursemapError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| CoursemapError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(PROGRESS)
                .map_err(|e| CoursemapError::IoError(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| CoursemapError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| CoursemapError::IoError(e.to_string()))
    }
}
