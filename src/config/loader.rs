//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the tracker
//! configuration from a YAML file.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::{TrackerError, TrackerResult};
use crate::storage::{FileStorage, KeyValueStore, MemoryStorage};

use super::types::{StorageBackend, TrackerConfig};

/// Loads and provides access to the tracker configuration.
///
/// # Example
///
/// ```no_run
/// use timesheet_tracker::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/tracker.yaml")?;
/// println!("Binding to {}", loader.config().server.bind_address);
/// # Ok::<(), timesheet_tracker::error::TrackerError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: TrackerConfig,
}

impl ConfigLoader {
    /// Loads configuration from the YAML file at `path`.
    ///
    /// Returns `ConfigNotFound` if the file cannot be read and
    /// `ConfigParseError` if it is not valid configuration YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> TrackerResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| TrackerError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::parse(&content, path_str)
    }

    /// Parses configuration from inline YAML.
    ///
    /// ```
    /// use timesheet_tracker::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::from_yaml_str("scanner:\n  cooldown_seconds: 5\n")?;
    /// assert_eq!(loader.config().scanner.cooldown_seconds, 5);
    /// assert_eq!(loader.config().clock_out.default_break_minutes, 30);
    /// # Ok::<(), timesheet_tracker::error::TrackerError>(())
    /// ```
    pub fn from_yaml_str(content: &str) -> TrackerResult<Self> {
        Self::parse(content, "<inline>".to_string())
    }

    fn parse(content: &str, path: String) -> TrackerResult<Self> {
        // serde_yaml reads an empty document as null rather than an empty map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config = serde_yaml::from_str(content).map_err(|e| TrackerError::ConfigParseError {
            path,
            message: e.to_string(),
        })?;

        Ok(Self { config })
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> TrackerConfig {
        self.config
    }

    /// Opens the storage backend named by the `storage` section.
    pub fn open_storage(&self) -> TrackerResult<Arc<dyn KeyValueStore>> {
        let storage = &self.config.storage;
        match storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                Ok(Arc::new(MemoryStorage::new()))
            }
            StorageBackend::File => {
                let files = FileStorage::open(&storage.directory)?;
                info!(directory = %storage.directory.display(), "Using file storage");
                Ok(Arc::new(files))
            }
        }
    }
}
