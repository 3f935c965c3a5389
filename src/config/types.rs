//! Configuration types for the tracker.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML configuration file. Every section and
//! field has a default, so a partial (or empty) file is valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::store::{DEFAULT_EVENT_CAPACITY, DEFAULT_RECORD_KEY, StoreOptions};

/// Top-level tracker configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Where the employee collection is persisted.
    pub storage: StorageConfig,
    /// QR scanner behaviour.
    pub scanner: ScannerConfig,
    /// Defaults applied when clocking out.
    pub clock_out: ClockOutConfig,
    /// Change-notification channel sizing.
    pub events: EventsConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
}

impl TrackerConfig {
    /// Store construction options derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            record_key: self.storage.record_key.clone(),
            event_capacity: self.events.channel_capacity,
        }
    }
}

/// Persistence backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; nothing survives a restart.
    Memory,
    /// One JSON file per record in a directory.
    #[default]
    File,
}

/// Storage section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// The backend to use.
    pub backend: StorageBackend,
    /// Directory for the file backend.
    pub directory: PathBuf,
    /// Key the employee collection is stored under.
    pub record_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            directory: PathBuf::from("./data"),
            record_key: DEFAULT_RECORD_KEY.to_string(),
        }
    }
}

/// Scanner section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Seconds during which a repeated scan of the same content is ignored.
    pub cooldown_seconds: u64,
}

impl ScannerConfig {
    /// The cooldown as a [`Duration`].
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 3,
        }
    }
}

/// Clock-out section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClockOutConfig {
    /// Break recorded when a clock-out request does not specify one.
    pub default_break_minutes: u32,
}

impl Default for ClockOutConfig {
    fn default() -> Self {
        Self {
            default_break_minutes: 30,
        }
    }
}

/// Events section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Buffered events per subscriber.
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Server section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}
