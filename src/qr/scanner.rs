//! Applying scanned payloads to the store.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{TrackerError, TrackerResult};
use crate::models::{Employee, TimeEntry};
use crate::store::{EmployeeResolution, EmployeeStore, EntryImport};

use super::payload::{QrPayload, SummaryCard};

/// Cooldown used by the original scanner screen.
pub const DEFAULT_SCAN_COOLDOWN: Duration = Duration::from_secs(3);

/// What a scan did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ScanOutcome {
    /// An employee payload matched an existing employee id.
    EmployeeFound {
        /// The matched employee.
        employee: Employee,
    },
    /// An employee payload created a new employee.
    EmployeeAdded {
        /// The created employee.
        employee: Employee,
    },
    /// A time-entry payload was appended.
    #[serde(rename_all = "camelCase")]
    TimeEntryAdded {
        /// The employee the entry was resolved to.
        employee_name: String,
        /// The appended entry.
        entry: TimeEntry,
    },
    /// A time-entry payload was already recorded; nothing changed.
    #[serde(rename_all = "camelCase")]
    TimeEntryAlreadyPresent {
        /// The employee the entry was resolved to.
        employee_name: String,
    },
    /// A summary payload, shown but never stored.
    SummaryShown {
        /// The decoded summary.
        summary: SummaryCard,
    },
    /// The same content was scanned again within the cooldown.
    Debounced,
}

impl ScanOutcome {
    /// User-facing description of the outcome.
    pub fn message(&self) -> String {
        match self {
            ScanOutcome::EmployeeFound { employee } => {
                format!("Employee found: {}", employee.name)
            }
            ScanOutcome::EmployeeAdded { employee } => {
                format!("Added new employee: {}", employee.name)
            }
            ScanOutcome::TimeEntryAdded {
                employee_name,
                entry,
            } => format!(
                "Added time entry for {}: {}",
                employee_name,
                entry.formatted_hours()
            ),
            ScanOutcome::TimeEntryAlreadyPresent { employee_name } => {
                format!("Time entry already exists for {}", employee_name)
            }
            ScanOutcome::SummaryShown { summary } => format!(
                "Summary for {}:\nTotal Hours: {:.2}\nToday's Hours: {:.2}",
                summary.employee_name, summary.total_hours, summary.today_hours
            ),
            ScanOutcome::Debounced => "Scan ignored: same code scanned moments ago".to_string(),
        }
    }

    /// The employee a scanner should act on next, if the scan named one.
    pub fn resolved_employee(&self) -> Option<&Employee> {
        match self {
            ScanOutcome::EmployeeFound { employee } | ScanOutcome::EmployeeAdded { employee } => {
                Some(employee)
            }
            _ => None,
        }
    }
}

/// Applies a decoded payload to the store.
///
/// - `employee` payloads resolve by id and create the employee when it is
///   unknown. Unlike [`EmployeeStore::add_employee`], which always generates
///   a fresh id, the created employee keeps the payload's id, so scanning
///   the same card twice finds the employee instead of adding a duplicate.
/// - `timeEntry` payloads resolve by exact employee *name*; an entry id the
///   employee already has is left alone.
/// - `summary` payloads never touch the store.
pub fn apply_payload(store: &EmployeeStore, payload: &QrPayload) -> TrackerResult<ScanOutcome> {
    match payload {
        QrPayload::Employee(card) => {
            match store.resolve_employee(&card.id, &card.name, card.employee_type)? {
                EmployeeResolution::Existing(employee) => {
                    Ok(ScanOutcome::EmployeeFound { employee })
                }
                EmployeeResolution::Created(employee) => {
                    info!(employee_id = %employee.id, "Employee created from scanned code");
                    Ok(ScanOutcome::EmployeeAdded { employee })
                }
            }
        }
        QrPayload::TimeEntry(card) => {
            let entry = TimeEntry {
                id: card.id.clone(),
                clock_in_time: card.clock_in,
                clock_out_time: card.clock_out,
                break_minutes: card.break_minutes,
            };
            match store.import_time_entry(&card.employee_name, entry)? {
                EntryImport::Added { employee, entry } => Ok(ScanOutcome::TimeEntryAdded {
                    employee_name: employee.name,
                    entry,
                }),
                EntryImport::AlreadyPresent { employee } => {
                    Ok(ScanOutcome::TimeEntryAlreadyPresent {
                        employee_name: employee.name,
                    })
                }
            }
        }
        QrPayload::Summary(card) => Ok(ScanOutcome::SummaryShown {
            summary: card.clone(),
        }),
    }
}

/// Decodes payload text and applies it.
pub fn process_scan(store: &EmployeeStore, content: &str) -> TrackerResult<ScanOutcome> {
    let payload = QrPayload::decode(content).inspect_err(|e| {
        warn!(error = %e, "Rejected scanned code");
    })?;
    apply_payload(store, &payload)
}

/// Suppresses repeated scans of identical content within a cooldown window.
///
/// Cameras report the same code many times per second while it is in view.
#[derive(Debug, Clone)]
pub struct ScanDebouncer {
    cooldown: Duration,
    last: Option<(Instant, String)>,
}

impl ScanDebouncer {
    /// Creates a debouncer with the given window.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
        }
    }

    /// The configured window.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Returns true if `content` seen at `now` should be processed, and
    /// records it as the latest accepted scan.
    pub fn admit(&mut self, content: &str, now: Instant) -> bool {
        if let Some((at, last_content)) = &self.last {
            if last_content == content && now.saturating_duration_since(*at) < self.cooldown {
                return false;
            }
        }
        self.last = Some((now, content.to_string()));
        true
    }
}

impl Default for ScanDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_COOLDOWN)
    }
}

/// A scanning session: debounced scans plus clock actions on the last
/// employee whose code was scanned.
#[derive(Debug)]
pub struct ScanSession<'a> {
    store: &'a EmployeeStore,
    debouncer: ScanDebouncer,
    current_employee_id: Option<String>,
}

impl<'a> ScanSession<'a> {
    /// Starts a session over `store`.
    pub fn new(store: &'a EmployeeStore, cooldown: Duration) -> Self {
        Self {
            store,
            debouncer: ScanDebouncer::new(cooldown),
            current_employee_id: None,
        }
    }

    /// Processes one scan reported at `now`.
    pub fn scan(&mut self, content: &str, now: Instant) -> TrackerResult<ScanOutcome> {
        if !self.debouncer.admit(content, now) {
            return Ok(ScanOutcome::Debounced);
        }
        let outcome = process_scan(self.store, content)?;
        if let Some(employee) = outcome.resolved_employee() {
            self.current_employee_id = Some(employee.id.clone());
        }
        Ok(outcome)
    }

    /// A fresh copy of the current employee, if one was scanned and still exists.
    pub fn current_employee(&self) -> Option<Employee> {
        self.current_employee_id
            .as_deref()
            .and_then(|id| self.store.employee(id))
    }

    /// Clocks the current employee in.
    pub fn clock_in(&self) -> TrackerResult<TimeEntry> {
        self.store.clock_in(self.current_id()?)
    }

    /// Clocks the current employee out.
    pub fn clock_out(&self, break_minutes: u32) -> TrackerResult<TimeEntry> {
        self.store.clock_out(self.current_id()?, break_minutes)
    }

    /// Describes whether the current employee is clocked in.
    pub fn status_message(&self) -> Option<String> {
        let employee = self.current_employee()?;
        Some(match employee.current_time_entry() {
            Some(entry) => format!(
                "{} is currently clocked in (since {})",
                employee.name,
                entry.formatted_clock_in_time()
            ),
            None => format!("{} is not clocked in", employee.name),
        })
    }

    fn current_id(&self) -> TrackerResult<&str> {
        self.current_employee_id
            .as_deref()
            .ok_or(TrackerError::NoEmployeeSelected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;

    use crate::clock::FixedClock;
    use crate::error::{ErrorKind, PayloadError};
    use crate::models::EmployeeType;

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn create_test_store() -> (EmployeeStore, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(make_datetime("2024-01-11 09:00:00")));
        (EmployeeStore::in_memory(clock.clone()), clock)
    }

    const ENTRY_PAYLOAD: &str = r#"{
        "type": "timeEntry",
        "id": "t1",
        "employeeName": "Ada",
        "clockIn": "2024-01-10T22:00:00",
        "clockOut": "2024-01-11T06:00:00",
        "breakMinutes": 30
    }"#;

    #[test]
    fn test_employee_payload_creates_then_finds() {
        let (store, _) = create_test_store();
        let text = r#"{"type": "employee", "id": "e7", "name": "Ada", "employeeType": "Manager"}"#;

        let first = process_scan(&store, text).unwrap();
        match &first {
            ScanOutcome::EmployeeAdded { employee } => {
                assert_eq!(employee.id, "e7");
                assert_eq!(employee.employee_type, EmployeeType::Manager);
            }
            other => panic!("Expected EmployeeAdded, got {:?}", other),
        }
        assert_eq!(first.message(), "Added new employee: Ada");

        let second = process_scan(&store, text).unwrap();
        assert!(matches!(second, ScanOutcome::EmployeeFound { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_time_entry_payload_replay_is_noop() {
        let (store, _) = create_test_store();
        let ada = store.add_employee("Ada", EmployeeType::Staff).unwrap();

        let first = process_scan(&store, ENTRY_PAYLOAD).unwrap();
        assert_eq!(first.message(), "Added time entry for Ada: 7.50 hrs ⏱️");

        let second = process_scan(&store, ENTRY_PAYLOAD).unwrap();
        assert_eq!(
            second,
            ScanOutcome::TimeEntryAlreadyPresent {
                employee_name: "Ada".to_string()
            }
        );
        assert_eq!(store.employee(&ada.id).unwrap().time_entries.len(), 1);
    }

    #[test]
    fn test_time_entry_resolves_by_name_not_id() {
        let (store, _) = create_test_store();
        let mut ada = store.add_employee("Ada", EmployeeType::Staff).unwrap();
        ada.name = "Ada Lovelace".to_string();
        store.update_employee(ada).unwrap();

        let err = process_scan(&store, ENTRY_PAYLOAD).unwrap_err();
        assert!(matches!(err, TrackerError::EmployeeNameNotFound { ref name } if name == "Ada"));
    }

    #[test]
    fn test_summary_payload_does_not_mutate() {
        let (store, _) = create_test_store();
        let text = r#"{"type": "summary", "employeeId": "e1", "employeeName": "Ada",
                       "totalHours": 12.5, "todayHours": 4}"#;
        let outcome = process_scan(&store, text).unwrap();
        match &outcome {
            ScanOutcome::SummaryShown { summary } => {
                assert_eq!(summary.total_hours, Decimal::new(125, 1));
            }
            other => panic!("Expected SummaryShown, got {:?}", other),
        }
        assert_eq!(
            outcome.message(),
            "Summary for Ada:\nTotal Hours: 12.50\nToday's Hours: 4.00"
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_malformed_payload_is_malformed_input() {
        let (store, _) = create_test_store();
        let err = process_scan(&store, r#"{"type": "badge"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(matches!(
            err,
            TrackerError::Payload(PayloadError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_debouncer_suppresses_identical_content_within_cooldown() {
        let mut debouncer = ScanDebouncer::new(Duration::from_secs(3));
        let start = Instant::now();

        assert!(debouncer.admit("a", start));
        assert!(!debouncer.admit("a", start + Duration::from_secs(1)));
        assert!(debouncer.admit("b", start + Duration::from_secs(1)));
        assert!(debouncer.admit("a", start + Duration::from_secs(2)));
        assert!(debouncer.admit("a", start + Duration::from_secs(5)));
    }

    #[test]
    fn test_session_clock_actions_follow_scanned_employee() {
        let (store, clock) = create_test_store();
        let mut session = ScanSession::new(&store, DEFAULT_SCAN_COOLDOWN);
        let start = Instant::now();

        assert!(matches!(
            session.clock_in(),
            Err(TrackerError::NoEmployeeSelected)
        ));

        let text = r#"{"type": "employee", "id": "e1", "name": "Ada", "employeeType": "Staff"}"#;
        session.scan(text, start).unwrap();
        assert_eq!(
            session.scan(text, start + Duration::from_millis(500)).unwrap(),
            ScanOutcome::Debounced
        );
        assert_eq!(
            session.status_message().as_deref(),
            Some("Ada is not clocked in")
        );

        session.clock_in().unwrap();
        assert_eq!(
            session.status_message().as_deref(),
            Some("Ada is currently clocked in (since 9:00 AM)")
        );

        clock.advance(chrono::Duration::hours(4));
        let entry = session.clock_out(0).unwrap();
        assert_eq!(entry.hours_worked(), Decimal::from(4));
        assert!(!session.current_employee().unwrap().is_clocked_in());
    }
}
