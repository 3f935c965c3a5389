//! Abstract key-value persistence.
//!
//! The store keeps its whole employee collection as one text record under a
//! fixed key. Any backend that can read and replace a record by key can back
//! it: [`MemoryStorage`] for tests and ephemeral runs, [`FileStorage`] for a
//! directory on disk.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::TrackerResult;

/// A durable map from record keys to text values.
///
/// Implementations must replace a record atomically: a reader never sees a
/// half-written value.
pub trait KeyValueStore: Send + Sync {
    /// Reads the record stored under `key`, if any.
    fn get(&self, key: &str) -> TrackerResult<Option<String>>;

    /// Replaces the record stored under `key`.
    fn put(&self, key: &str, value: &str) -> TrackerResult<()>;
}
