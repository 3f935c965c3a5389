//! The employee repository.
//!
//! [`EmployeeStore`] owns the authoritative collection of employees for the
//! lifetime of the process. It is constructed once at startup and shared by
//! reference (typically behind an `Arc`) with every consumer.
//!
//! Each operation runs as one critical section: the collection is locked,
//! the change is prepared on a copy, the whole collection is written to the
//! backing [`KeyValueStore`], and only then is the copy committed and a
//! [`StoreEvent`] published. A failed write leaves memory untouched.

mod events;

pub use events::{Refreshable, StoreEvent, refresh_on_change};

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, Receiver, Sender, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{TrackerError, TrackerResult};
use crate::models::timestamp::iso_local;
use crate::models::{Employee, EmployeeType, TimeEntry, roll_overnight};
use crate::storage::{KeyValueStore, MemoryStorage};

/// Record key used when none is configured.
pub const DEFAULT_RECORD_KEY: &str = "employees";

/// Default capacity of the change-notification channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Construction options for [`EmployeeStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Key of the persisted employee collection.
    pub record_key: String,
    /// Buffered events per subscriber before it starts lagging.
    pub event_capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            record_key: DEFAULT_RECORD_KEY.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// A manually entered (or edited) span.
///
/// Timestamps use the persisted `yyyy-MM-ddTHH:mm:ss` form; minute precision
/// is accepted on input and fractional seconds are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    /// Clock-in instant.
    #[serde(with = "iso_local")]
    pub clock_in: NaiveDateTime,
    /// Clock-out instant; `None` records an open entry.
    #[serde(default, with = "iso_local::option")]
    pub clock_out: Option<NaiveDateTime>,
    /// Unpaid break minutes.
    #[serde(default)]
    pub break_minutes: u32,
}

/// Result of looking up an employee by id and creating it when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeResolution {
    /// The id was already known.
    Existing(Employee),
    /// A new employee was created.
    Created(Employee),
}

/// Result of importing a time entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryImport {
    /// The entry was appended to the employee.
    Added {
        /// The employee after the import.
        employee: Employee,
        /// The appended entry.
        entry: TimeEntry,
    },
    /// The employee already had an entry with this id; nothing changed.
    AlreadyPresent {
        /// The unchanged employee.
        employee: Employee,
    },
}

enum Change<T> {
    Applied { value: T, event: StoreEvent },
    Unchanged(T),
}

/// The repository of employees and their time entries.
pub struct EmployeeStore {
    employees: Mutex<Vec<Employee>>,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    record_key: String,
    events: Sender<StoreEvent>,
}

impl std::fmt::Debug for EmployeeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmployeeStore")
            .field("record_key", &self.record_key)
            .field("employees", &self.lock().len())
            .finish()
    }
}

impl EmployeeStore {
    /// Opens the store, loading the persisted collection.
    ///
    /// A missing record starts an empty store. An unreadable or corrupt
    /// record is logged and also starts an empty store; it is not repaired
    /// and will be overwritten by the next mutation.
    pub fn open(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        options: StoreOptions,
    ) -> Self {
        let employees = Self::load(storage.as_ref(), &options.record_key);
        info!(
            record_key = %options.record_key,
            employees = employees.len(),
            "Employee store opened"
        );
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            employees: Mutex::new(employees),
            storage,
            clock,
            record_key: options.record_key,
            events,
        }
    }

    /// Opens an empty store backed by process memory.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::open(
            Arc::new(MemoryStorage::new()),
            clock,
            StoreOptions::default(),
        )
    }

    fn load(storage: &dyn KeyValueStore, record_key: &str) -> Vec<Employee> {
        let json = match storage.get(record_key) {
            Ok(Some(json)) => json,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(record_key, error = %e, "Failed to read employee record, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&json) {
            Ok(employees) => employees,
            Err(e) => {
                warn!(record_key, error = %e, "Corrupt employee record, starting empty");
                Vec::new()
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Employee>> {
        self.employees.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, employees: &[Employee]) -> TrackerResult<()> {
        let json = serde_json::to_string(employees).map_err(|e| TrackerError::Storage {
            key: self.record_key.clone(),
            message: e.to_string(),
        })?;
        self.storage.put(&self.record_key, &json)?;
        debug!(
            record_key = %self.record_key,
            employees = employees.len(),
            "Employee collection persisted"
        );
        Ok(())
    }

    fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Vec<Employee>) -> TrackerResult<Change<T>>,
    ) -> TrackerResult<T> {
        let mut employees = self.lock();
        let mut draft = employees.clone();

        match apply(&mut draft)? {
            Change::Applied { value, event } => {
                self.persist(&draft)?;
                *employees = draft;
                drop(employees);
                // No subscribers is fine.
                let _ = self.events.send(event);
                Ok(value)
            }
            Change::Unchanged(value) => Ok(value),
        }
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// The clock used for clock-in/clock-out and "today".
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// The current date according to the store's clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// A snapshot of every employee.
    pub fn all_employees(&self) -> Vec<Employee> {
        self.lock().clone()
    }

    /// Number of employees.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if there are no employees.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Looks up an employee by id.
    pub fn employee(&self, id: &str) -> Option<Employee> {
        self.lock().iter().find(|e| e.id == id).cloned()
    }

    /// Looks up the first employee with exactly this name.
    pub fn employee_by_name(&self, name: &str) -> Option<Employee> {
        self.lock().iter().find(|e| e.name == name).cloned()
    }

    /// Worked hours summed per employee type.
    ///
    /// Types without employees are absent from the map, not zero.
    pub fn total_hours_by_type(&self) -> BTreeMap<EmployeeType, Decimal> {
        let mut totals = BTreeMap::new();
        for employee in self.lock().iter() {
            *totals.entry(employee.employee_type).or_insert(Decimal::ZERO) +=
                employee.total_hours();
        }
        totals
    }

    /// Worked hours summed over every employee.
    pub fn total_hours(&self) -> Decimal {
        self.lock().iter().map(Employee::total_hours).sum()
    }

    /// Adds a new employee with a generated id and no entries.
    ///
    /// Names are not deduplicated.
    pub fn add_employee(
        &self,
        name: impl Into<String>,
        employee_type: EmployeeType,
    ) -> TrackerResult<Employee> {
        let employee = Employee::new(name, employee_type);
        let added = self.mutate(|employees| {
            employees.push(employee.clone());
            Ok(Change::Applied {
                event: StoreEvent::EmployeeAdded {
                    employee_id: employee.id.clone(),
                },
                value: employee,
            })
        })?;
        info!(employee_id = %added.id, name = %added.name, "Employee added");
        Ok(added)
    }

    /// Adds a fully formed employee record, keeping its id and entries.
    pub fn insert_employee(&self, employee: Employee) -> TrackerResult<Employee> {
        self.mutate(|employees| {
            if employees.iter().any(|e| e.id == employee.id) {
                return Err(TrackerError::DuplicateEmployee {
                    id: employee.id.clone(),
                });
            }
            ensure_valid_entries(&employee)?;
            employees.push(employee.clone());
            Ok(Change::Applied {
                event: StoreEvent::EmployeeAdded {
                    employee_id: employee.id.clone(),
                },
                value: employee,
            })
        })
    }

    /// Returns the employee with `id`, creating it from `name` and `employee_type`
    /// (under that same id) when it does not exist yet.
    pub fn resolve_employee(
        &self,
        id: &str,
        name: &str,
        employee_type: EmployeeType,
    ) -> TrackerResult<EmployeeResolution> {
        self.mutate(|employees| {
            if let Some(existing) = employees.iter().find(|e| e.id == id) {
                return Ok(Change::Unchanged(EmployeeResolution::Existing(
                    existing.clone(),
                )));
            }
            let employee = Employee {
                id: id.to_string(),
                name: name.to_string(),
                employee_type,
                time_entries: Vec::new(),
            };
            employees.push(employee.clone());
            Ok(Change::Applied {
                event: StoreEvent::EmployeeAdded {
                    employee_id: employee.id.clone(),
                },
                value: EmployeeResolution::Created(employee),
            })
        })
    }

    /// Replaces the stored record that has the same id.
    ///
    /// # Errors
    ///
    /// `EmployeeNotFound` for an unknown id, `MultipleOpenEntries` or
    /// `DuplicateTimeEntry` if the record's entries are inconsistent.
    pub fn update_employee(&self, employee: Employee) -> TrackerResult<Employee> {
        self.mutate(|employees| {
            ensure_valid_entries(&employee)?;
            let slot = employees
                .iter_mut()
                .find(|e| e.id == employee.id)
                .ok_or_else(|| TrackerError::EmployeeNotFound {
                    id: employee.id.clone(),
                })?;
            *slot = employee.clone();
            Ok(Change::Applied {
                event: StoreEvent::EmployeeUpdated {
                    employee_id: employee.id.clone(),
                },
                value: employee,
            })
        })
    }

    /// Removes an employee together with all of their entries.
    ///
    /// Returns the removed record, or `None` if the id was unknown.
    pub fn delete_employee(&self, id: &str) -> TrackerResult<Option<Employee>> {
        let removed = self.mutate(|employees| {
            let Some(index) = employees.iter().position(|e| e.id == id) else {
                return Ok(Change::Unchanged(None));
            };
            let removed = employees.remove(index);
            Ok(Change::Applied {
                event: StoreEvent::EmployeeDeleted {
                    employee_id: removed.id.clone(),
                },
                value: Some(removed),
            })
        })?;
        if let Some(employee) = &removed {
            info!(
                employee_id = %employee.id,
                entries = employee.time_entries.len(),
                "Employee deleted"
            );
        }
        Ok(removed)
    }

    /// Opens a new entry at the current time.
    ///
    /// # Errors
    ///
    /// `EmployeeNotFound` for an unknown id, `AlreadyClockedIn` if the
    /// employee already has an open entry.
    pub fn clock_in(&self, employee_id: &str) -> TrackerResult<TimeEntry> {
        let now = self.clock.now();
        let entry = self.mutate(|employees| {
            let employee = find_mut(employees, employee_id)?;
            if employee.is_clocked_in() {
                return Err(TrackerError::AlreadyClockedIn {
                    employee_id: employee_id.to_string(),
                });
            }
            let entry = TimeEntry::open(now);
            employee.time_entries.push(entry.clone());
            Ok(Change::Applied {
                event: StoreEvent::ClockedIn {
                    employee_id: employee_id.to_string(),
                    entry_id: entry.id.clone(),
                },
                value: entry,
            })
        })?;
        info!(employee_id, entry_id = %entry.id, at = %entry.clock_in_time, "Clocked in");
        Ok(entry)
    }

    /// Closes the open entry at the current time with the given break.
    ///
    /// # Errors
    ///
    /// `EmployeeNotFound` for an unknown id, `NotClockedIn` if the employee
    /// has no open entry.
    pub fn clock_out(&self, employee_id: &str, break_minutes: u32) -> TrackerResult<TimeEntry> {
        let now = self.clock.now();
        let entry = self.mutate(|employees| {
            let employee = find_mut(employees, employee_id)?;
            let entry = employee.current_time_entry_mut().ok_or_else(|| {
                TrackerError::NotClockedIn {
                    employee_id: employee_id.to_string(),
                }
            })?;
            entry.close(now, break_minutes);
            let entry = entry.clone();
            Ok(Change::Applied {
                event: StoreEvent::ClockedOut {
                    employee_id: employee_id.to_string(),
                    entry_id: entry.id.clone(),
                },
                value: entry,
            })
        })?;
        info!(
            employee_id,
            entry_id = %entry.id,
            hours = %entry.hours_worked(),
            "Clocked out"
        );
        Ok(entry)
    }

    /// Appends a manually entered span.
    ///
    /// A clock-out earlier than the clock-in is moved to the next day.
    pub fn add_time_entry(&self, employee_id: &str, manual: ManualEntry) -> TrackerResult<TimeEntry> {
        self.mutate(|employees| {
            let employee = find_mut(employees, employee_id)?;
            let clock_out = roll_overnight(manual.clock_in, manual.clock_out)?;
            if clock_out.is_none() && employee.is_clocked_in() {
                return Err(TrackerError::AlreadyClockedIn {
                    employee_id: employee_id.to_string(),
                });
            }
            let entry = TimeEntry::with_span(manual.clock_in, clock_out, manual.break_minutes);
            employee.time_entries.push(entry.clone());
            Ok(Change::Applied {
                event: StoreEvent::TimeEntryAdded {
                    employee_id: employee_id.to_string(),
                    entry_id: entry.id.clone(),
                },
                value: entry,
            })
        })
    }

    /// Rewrites the span of an existing entry, keeping its id.
    pub fn update_time_entry(
        &self,
        employee_id: &str,
        entry_id: &str,
        manual: ManualEntry,
    ) -> TrackerResult<TimeEntry> {
        self.mutate(|employees| {
            let employee = find_mut(employees, employee_id)?;
            let clock_out = roll_overnight(manual.clock_in, manual.clock_out)?;
            if clock_out.is_none()
                && employee
                    .time_entries
                    .iter()
                    .any(|e| e.is_open() && e.id != entry_id)
            {
                return Err(TrackerError::MultipleOpenEntries {
                    employee_id: employee_id.to_string(),
                });
            }
            let entry = employee
                .time_entries
                .iter_mut()
                .find(|e| e.id == entry_id)
                .ok_or_else(|| TrackerError::TimeEntryNotFound {
                    employee_id: employee_id.to_string(),
                    entry_id: entry_id.to_string(),
                })?;
            entry.clock_in_time = manual.clock_in;
            entry.clock_out_time = clock_out;
            entry.break_minutes = manual.break_minutes;
            let entry = entry.clone();
            Ok(Change::Applied {
                event: StoreEvent::TimeEntryUpdated {
                    employee_id: employee_id.to_string(),
                    entry_id: entry.id.clone(),
                },
                value: entry,
            })
        })
    }

    /// Removes one entry and returns it.
    pub fn delete_time_entry(&self, employee_id: &str, entry_id: &str) -> TrackerResult<TimeEntry> {
        self.mutate(|employees| {
            let employee = find_mut(employees, employee_id)?;
            let index = employee
                .time_entries
                .iter()
                .position(|e| e.id == entry_id)
                .ok_or_else(|| TrackerError::TimeEntryNotFound {
                    employee_id: employee_id.to_string(),
                    entry_id: entry_id.to_string(),
                })?;
            let entry = employee.time_entries.remove(index);
            Ok(Change::Applied {
                event: StoreEvent::TimeEntryDeleted {
                    employee_id: employee_id.to_string(),
                    entry_id: entry.id.clone(),
                },
                value: entry,
            })
        })
    }

    /// Appends an entry that already has an id to the employee with exactly
    /// `employee_name`.
    ///
    /// Importing an id the employee already has is a no-op, so replaying the
    /// same entry is harmless. Resolution is by name, not id: renaming an
    /// employee makes earlier exports of their entries unresolvable.
    pub fn import_time_entry(&self, employee_name: &str, entry: TimeEntry) -> TrackerResult<EntryImport> {
        self.mutate(|employees| {
            let employee = employees
                .iter_mut()
                .find(|e| e.name == employee_name)
                .ok_or_else(|| TrackerError::EmployeeNameNotFound {
                    name: employee_name.to_string(),
                })?;
            if employee.time_entry(&entry.id).is_some() {
                return Ok(Change::Unchanged(EntryImport::AlreadyPresent {
                    employee: employee.clone(),
                }));
            }
            if entry.is_open() && employee.is_clocked_in() {
                return Err(TrackerError::AlreadyClockedIn {
                    employee_id: employee.id.clone(),
                });
            }
            employee.time_entries.push(entry.clone());
            Ok(Change::Applied {
                event: StoreEvent::TimeEntryAdded {
                    employee_id: employee.id.clone(),
                    entry_id: entry.id.clone(),
                },
                value: EntryImport::Added {
                    employee: employee.clone(),
                    entry,
                },
            })
        })
    }

    /// Removes every employee and persists the empty collection.
    pub fn reset_all_data(&self) -> TrackerResult<()> {
        self.mutate(|employees| {
            employees.clear();
            Ok(Change::Applied {
                value: (),
                event: StoreEvent::DataReset,
            })
        })?;
        warn!(record_key = %self.record_key, "All employee data reset");
        Ok(())
    }

    /// Drains queued events and refreshes `target` once if there were any.
    ///
    /// Returns the number of events consumed. Suited to UI loops that poll
    /// a receiver between frames instead of awaiting it.
    pub fn refresh_pending<R: Refreshable>(
        &self,
        events: &mut Receiver<StoreEvent>,
        target: &mut R,
    ) -> usize {
        let mut consumed = 0;
        loop {
            match events.try_recv() {
                Ok(_) => consumed += 1,
                Err(TryRecvError::Lagged(skipped)) => consumed += skipped as usize,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if consumed > 0 {
            target.refresh(self);
        }
        consumed
    }
}

fn find_mut<'a>(employees: &'a mut [Employee], id: &str) -> TrackerResult<&'a mut Employee> {
    employees
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| TrackerError::EmployeeNotFound { id: id.to_string() })
}

/// Checks a full record before it replaces or joins the collection.
///
/// Entry ids must be unique per employee: imports and deletes address
/// entries by id.
fn ensure_valid_entries(employee: &Employee) -> TrackerResult<()> {
    if employee.open_entry_count() > 1 {
        return Err(TrackerError::MultipleOpenEntries {
            employee_id: employee.id.clone(),
        });
    }
    let mut seen = HashSet::with_capacity(employee.time_entries.len());
    if let Some(duplicate) = employee
        .time_entries
        .iter()
        .find(|entry| !seen.insert(entry.id.as_str()))
    {
        return Err(TrackerError::DuplicateTimeEntry {
            employee_id: employee.id.clone(),
            entry_id: duplicate.id.clone(),
        });
    }
    Ok(())
}
