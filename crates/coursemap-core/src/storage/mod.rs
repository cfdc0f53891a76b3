//! # Storage
//!
//! Opaque key-value persistence keyed by department code.
//!
//! The core only ever reads and writes whole serialized progress maps; the
//! payload format lives in [`crate::formats`].

mod redb_store;

pub use redb_store::RedbStore;

use crate::CoursemapError;
use std::collections::BTreeMap;

/// Key-value persistence for serialized progress maps.
pub trait KeyValueStore {
    /// Read the payload stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, CoursemapError>;

    /// Replace the payload stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), CoursemapError>;
}

/// Volatile key-value store for tests and `--backend memory`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a key (e.g. with a fixture payload).
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoursemapError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CoursemapError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage backend for a progress store.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory map (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    /// Check if this backend survives process restarts.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }
}

impl KeyValueStore for StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, CoursemapError> {
        match self {
            Self::InMemory(store) => store.get(key),
            Self::Persistent(store) => store.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CoursemapError> {
        match self {
            Self::InMemory(store) => store.set(key, value),
            Self::Persistent(store) => store.set(key, value),
        }
    }
}
