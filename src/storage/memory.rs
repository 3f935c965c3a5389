//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::TrackerResult;

use super::KeyValueStore;

/// Keeps records in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage pre-seeded with one record.
    pub fn with_record(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value.into());
        storage
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> TrackerResult<Option<String>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> TrackerResult<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
