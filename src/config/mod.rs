//! Configuration loading for the tracker.
//!
//! This module loads the tracker configuration from a single YAML file:
//! storage backend, scanner cooldown, clock-out defaults, event channel
//! sizing and the HTTP bind address.
//!
//! # Example
//!
//! ```no_run
//! use timesheet_tracker::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/tracker.yaml").unwrap();
//! println!("Storage backend: {:?}", loader.config().storage.backend);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    ClockOutConfig, EventsConfig, ScannerConfig, ServerConfig, StorageBackend, StorageConfig,
    TrackerConfig,
};
