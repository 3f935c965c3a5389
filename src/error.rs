//! Error types for the timesheet tracker.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every error condition the store, the QR payload codec, the storage
//! backends and the configuration loader can report.

use thiserror::Error;

/// Broad classification of a [`TrackerError`].
///
/// Callers use this reason code to tell a missing record apart from a
/// rejected state transition without matching on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced employee or time entry does not exist.
    NotFound,
    /// The operation is not allowed in the current state (e.g. double clock-in).
    InvalidState,
    /// Scanned or submitted input could not be understood.
    MalformedInput,
    /// The backing storage could not be read or written.
    PersistenceFailure,
    /// The configuration could not be loaded.
    Configuration,
}

/// Failure to decode a QR payload.
///
/// The display strings are written to be shown to the person scanning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// The payload is not a JSON object.
    #[error("Invalid QR code format: {message}")]
    InvalidJson {
        /// Parser diagnostic.
        message: String,
    },

    /// The `type` discriminator names no known payload kind.
    #[error("Unknown QR code type: {kind}")]
    UnknownType {
        /// The unrecognized discriminator.
        kind: String,
    },

    /// A field required by the payload kind is absent.
    #[error("Missing required field in QR code: {field}")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// A field is present but has the wrong shape.
    #[error("Invalid field '{field}' in QR code: {message}")]
    InvalidField {
        /// Name of the offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// A timestamp field could not be parsed as a local date-time.
    #[error("Invalid date format in QR code field '{field}': {value}")]
    InvalidTimestamp {
        /// Name of the offending field.
        field: String,
        /// The raw value that failed to parse.
        value: String,
    },
}

/// The main error type for the timesheet tracker.
///
/// # Example
///
/// ```
/// use timesheet_tracker::error::{ErrorKind, TrackerError};
///
/// let error = TrackerError::AlreadyClockedIn {
///     employee_id: "e1".to_string(),
/// };
/// assert_eq!(error.to_string(), "Employee 'e1' is already clocked in");
/// assert_eq!(error.kind(), ErrorKind::InvalidState);
/// ```
#[derive(Debug, Error)]
pub enum TrackerError {
    /// No employee has the given id.
    #[error("Employee not found: {id}")]
    EmployeeNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// No employee has the given name.
    #[error("Employee not found: {name}")]
    EmployeeNameNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// The employee exists but has no entry with the given id.
    #[error("Time entry '{entry_id}' not found for employee '{employee_id}'")]
    TimeEntryNotFound {
        /// Owning employee.
        employee_id: String,
        /// The entry id that was looked up.
        entry_id: String,
    },

    /// Clock-in (or an open manual entry) while an entry is already open.
    #[error("Employee '{employee_id}' is already clocked in")]
    AlreadyClockedIn {
        /// The employee.
        employee_id: String,
    },

    /// Clock-out while no entry is open.
    #[error("Employee '{employee_id}' is not clocked in")]
    NotClockedIn {
        /// The employee.
        employee_id: String,
    },

    /// A record would leave the employee with more than one open entry.
    #[error("Employee '{employee_id}' would have more than one open time entry")]
    MultipleOpenEntries {
        /// The employee.
        employee_id: String,
    },

    /// An employee with this id already exists.
    #[error("Employee already exists: {id}")]
    DuplicateEmployee {
        /// The conflicting id.
        id: String,
    },

    /// A time entry with this id already exists on the employee.
    #[error("Time entry '{entry_id}' already exists for employee '{employee_id}'")]
    DuplicateTimeEntry {
        /// Owning employee.
        employee_id: String,
        /// The conflicting entry id.
        entry_id: String,
    },

    /// A submitted time entry cannot be stored as given.
    #[error("Invalid time entry: {message}")]
    InvalidTimeEntry {
        /// What was wrong with it.
        message: String,
    },

    /// A scanner action needs a resolved employee and none was scanned yet.
    #[error("No employee selected; scan an employee code first")]
    NoEmployeeSelected,

    /// A QR payload failed validation.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// The storage backend failed to read or write a record.
    #[error("Storage failure for record '{key}': {message}")]
    Storage {
        /// The record key.
        key: String,
        /// A description of the failure.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl TrackerError {
    /// Returns the reason code for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmployeeNotFound { .. }
            | Self::EmployeeNameNotFound { .. }
            | Self::TimeEntryNotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyClockedIn { .. }
            | Self::NotClockedIn { .. }
            | Self::MultipleOpenEntries { .. }
            | Self::DuplicateEmployee { .. }
            | Self::DuplicateTimeEntry { .. }
            | Self::NoEmployeeSelected => ErrorKind::InvalidState,
            Self::Payload(_) | Self::InvalidTimeEntry { .. } => ErrorKind::MalformedInput,
            Self::Storage { .. } => ErrorKind::PersistenceFailure,
            Self::ConfigNotFound { .. } | Self::ConfigParseError { .. } => {
                ErrorKind::Configuration
            }
        }
    }
}

/// A type alias for Results that return TrackerError.
pub type TrackerResult<T> = Result<T, TrackerError>;
