//! Employee model and related types.
//!
//! This module defines the Employee struct and EmployeeType enum
//! for representing workers and their recorded time.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time_entry::TimeEntry;

/// Classifies employees for reporting.
///
/// Persisted as `STAFF`/`TEMP`/`CONTRACTOR`/`MANAGER`; displayed (and
/// encoded in QR payloads) as `Staff`/`Temporary`/`Contractor`/`Manager`.
/// Deserialization accepts either spelling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum EmployeeType {
    /// Permanent staff.
    #[default]
    #[serde(rename = "STAFF", alias = "Staff")]
    Staff,
    /// Temporary worker.
    #[serde(rename = "TEMP", alias = "Temporary")]
    Temporary,
    /// External contractor.
    #[serde(rename = "CONTRACTOR", alias = "Contractor")]
    Contractor,
    /// Manager.
    #[serde(rename = "MANAGER", alias = "Manager")]
    Manager,
}

impl EmployeeType {
    /// Every employee type, in display order.
    pub const ALL: [EmployeeType; 4] = [
        EmployeeType::Staff,
        EmployeeType::Temporary,
        EmployeeType::Contractor,
        EmployeeType::Manager,
    ];

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            EmployeeType::Staff => "Staff",
            EmployeeType::Temporary => "Temporary",
            EmployeeType::Contractor => "Contractor",
            EmployeeType::Manager => "Manager",
        }
    }

    /// Looks up a type by its exact (case-sensitive) display name.
    ///
    /// # Examples
    ///
    /// ```
    /// use timesheet_tracker::models::EmployeeType;
    ///
    /// assert_eq!(EmployeeType::from_display_name("Temporary"), Some(EmployeeType::Temporary));
    /// assert_eq!(EmployeeType::from_display_name("temporary"), None);
    /// ```
    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.display_name() == name)
    }
}

impl fmt::Display for EmployeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An employee together with every time entry recorded for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Unique identifier, generated at creation.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Reporting classification.
    #[serde(rename = "type", default)]
    pub employee_type: EmployeeType,
    /// Time entries in recording order. At most one may be open.
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
}

impl Employee {
    /// Creates an employee with a generated id and no entries.
    pub fn new(name: impl Into<String>, employee_type: EmployeeType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            employee_type,
            time_entries: Vec::new(),
        }
    }

    /// Sum of worked hours over all entries; open entries contribute zero.
    pub fn total_hours(&self) -> Decimal {
        self.time_entries.iter().map(TimeEntry::hours_worked).sum()
    }

    /// Hours attributed to `today`.
    ///
    /// An entry counts if it started on `today`, or if it is a night shift
    /// that ended on `today`. A night shift therefore counts in full on both
    /// the day it starts and the day it ends.
    ///
    /// # Examples
    ///
    /// ```
    /// use timesheet_tracker::models::{Employee, EmployeeType, TimeEntry};
    /// use chrono::{NaiveDate, NaiveDateTime};
    /// use rust_decimal::Decimal;
    ///
    /// let mut employee = Employee::new("Ada", EmployeeType::Staff);
    /// employee.time_entries.push(TimeEntry::with_span(
    ///     NaiveDateTime::parse_from_str("2024-01-10 22:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
    ///     Some(NaiveDateTime::parse_from_str("2024-01-11 06:00:00", "%Y-%m-%d %H:%M:%S").unwrap()),
    ///     0,
    /// ));
    ///
    /// let jan_10 = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    /// let jan_11 = NaiveDate::from_ymd_opt(2024, 1, 11).unwrap();
    /// assert_eq!(employee.today_hours(jan_10), Decimal::from(8));
    /// assert_eq!(employee.today_hours(jan_11), Decimal::from(8));
    /// ```
    pub fn today_hours(&self, today: NaiveDate) -> Decimal {
        self.time_entries
            .iter()
            .filter(|entry| {
                entry.clock_in_time.date() == today
                    || (entry.is_night_shift()
                        && entry.clock_out_time.is_some_and(|out| out.date() == today))
            })
            .map(TimeEntry::hours_worked)
            .sum()
    }

    /// Returns true if any entry is open.
    pub fn is_clocked_in(&self) -> bool {
        self.time_entries.iter().any(TimeEntry::is_open)
    }

    /// The open entry, if the employee is clocked in.
    pub fn current_time_entry(&self) -> Option<&TimeEntry> {
        self.time_entries.iter().find(|entry| entry.is_open())
    }

    pub(crate) fn current_time_entry_mut(&mut self) -> Option<&mut TimeEntry> {
        self.time_entries.iter_mut().find(|entry| entry.is_open())
    }

    /// Entries whose clock-in and clock-out fall on different dates.
    pub fn night_shift_entries(&self) -> Vec<&TimeEntry> {
        self.time_entries
            .iter()
            .filter(|entry| entry.is_night_shift())
            .collect()
    }

    /// Looks up one of this employee's entries by id.
    pub fn time_entry(&self, entry_id: &str) -> Option<&TimeEntry> {
        self.time_entries.iter().find(|entry| entry.id == entry_id)
    }

    /// Number of open entries; anything above one violates the model.
    pub fn open_entry_count(&self) -> usize {
        self.time_entries.iter().filter(|entry| entry.is_open()).count()
    }
}
