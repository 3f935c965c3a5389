//! Change notification for store consumers.
//!
//! Every successful mutating store call publishes a [`StoreEvent`]. Views
//! implement [`Refreshable`] and are driven by [`refresh_on_change`] instead
//! of polling the store on a timer.

use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::{debug, warn};

use super::EmployeeStore;

/// What changed in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A new employee was added.
    EmployeeAdded {
        /// The new employee.
        employee_id: String,
    },
    /// An employee record was replaced.
    EmployeeUpdated {
        /// The employee.
        employee_id: String,
    },
    /// An employee and all of their entries were removed.
    EmployeeDeleted {
        /// The removed employee.
        employee_id: String,
    },
    /// An entry was opened by clocking in.
    ClockedIn {
        /// The employee.
        employee_id: String,
        /// The new open entry.
        entry_id: String,
    },
    /// The open entry was closed by clocking out.
    ClockedOut {
        /// The employee.
        employee_id: String,
        /// The closed entry.
        entry_id: String,
    },
    /// An entry was added manually or by scanning.
    TimeEntryAdded {
        /// The employee.
        employee_id: String,
        /// The new entry.
        entry_id: String,
    },
    /// An entry was edited.
    TimeEntryUpdated {
        /// The employee.
        employee_id: String,
        /// The edited entry.
        entry_id: String,
    },
    /// An entry was removed.
    TimeEntryDeleted {
        /// The employee.
        employee_id: String,
        /// The removed entry.
        entry_id: String,
    },
    /// Every employee was removed.
    DataReset,
}

impl StoreEvent {
    /// The employee the event concerns, if it concerns a single one.
    pub fn employee_id(&self) -> Option<&str> {
        match self {
            StoreEvent::EmployeeAdded { employee_id }
            | StoreEvent::EmployeeUpdated { employee_id }
            | StoreEvent::EmployeeDeleted { employee_id }
            | StoreEvent::ClockedIn { employee_id, .. }
            | StoreEvent::ClockedOut { employee_id, .. }
            | StoreEvent::TimeEntryAdded { employee_id, .. }
            | StoreEvent::TimeEntryUpdated { employee_id, .. }
            | StoreEvent::TimeEntryDeleted { employee_id, .. } => Some(employee_id),
            StoreEvent::DataReset => None,
        }
    }
}

/// A view that re-reads the store when told to.
pub trait Refreshable {
    /// Re-query whatever the view displays.
    fn refresh(&mut self, store: &EmployeeStore);
}

/// Calls `target.refresh` once per received event until the channel closes.
///
/// A receiver that fell behind still refreshes once, since it only needs
/// the latest state.
pub async fn refresh_on_change<R: Refreshable>(
    store: &EmployeeStore,
    mut events: Receiver<StoreEvent>,
    target: &mut R,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                debug!(?event, "Refreshing after store change");
                target.refresh(store);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Refresh listener lagged behind store events");
                target.refresh(store);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
