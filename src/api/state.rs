//! Application state for the tracker API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::qr::ScanDebouncer;
use crate::store::EmployeeStore;

/// Shared application state.
///
/// Contains resources that are shared across all request handlers: the
/// employee store, the loaded configuration and the scan debouncer.
#[derive(Clone)]
pub struct AppState {
    store: Arc<EmployeeStore>,
    config: Arc<TrackerConfig>,
    debouncer: Arc<Mutex<ScanDebouncer>>,
}

impl AppState {
    /// Creates a new application state around `store`.
    pub fn new(store: Arc<EmployeeStore>, config: TrackerConfig) -> Self {
        let debouncer = ScanDebouncer::new(config.scanner.cooldown());
        Self {
            store,
            config: Arc::new(config),
            debouncer: Arc::new(Mutex::new(debouncer)),
        }
    }

    /// Returns the employee store.
    pub fn store(&self) -> &EmployeeStore {
        &self.store
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Runs a store call on the blocking pool.
    ///
    /// Mutations write the whole collection to storage while holding the
    /// store lock, which must not stall the async workers.
    pub async fn with_store<T, F>(&self, call: F) -> TrackerResult<T>
    where
        F: FnOnce(&EmployeeStore) -> TrackerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || call(&store))
            .await
            .map_err(|e| TrackerError::Storage {
                key: self.config.storage.record_key.clone(),
                message: e.to_string(),
            })?
    }

    pub(crate) fn debouncer(&self) -> MutexGuard<'_, ScanDebouncer> {
        self.debouncer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::clock::SystemClock;
    use crate::models::EmployeeType;

    #[test]
    fn test_app_state_is_clone() {
        // Verify AppState can be cloned (required for axum state)
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_with_store_runs_mutation_off_the_async_worker() {
        let store = Arc::new(EmployeeStore::in_memory(Arc::new(SystemClock)));
        let state = AppState::new(store, TrackerConfig::default());

        let employee = state
            .with_store(|store| store.add_employee("Ada", EmployeeType::Staff))
            .await
            .unwrap();
        assert_eq!(state.store().employee(&employee.id), Some(employee));

        let err = state
            .with_store(|store| store.clock_out("missing", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::EmployeeNotFound { .. }));
    }

    #[test]
    fn test_debouncer_uses_configured_cooldown() {
        let mut config = TrackerConfig::default();
        config.scanner.cooldown_seconds = 7;
        let store = Arc::new(EmployeeStore::in_memory(Arc::new(SystemClock)));

        let state = AppState::new(store, config);
        assert_eq!(state.debouncer().cooldown(), Duration::from_secs(7));
    }
}
