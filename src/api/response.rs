//! Response types for the tracker API.
//!
//! This module defines the JSON views returned by the handlers, the error
//! body, and the mapping from [`TrackerError`] to HTTP status codes.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, TrackerError};
use crate::models::{Employee, TimeEntry};
use crate::qr::ScanOutcome;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response for a request the handler refused before touching the store.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

impl From<TrackerError> for ApiErrorResponse {
    fn from(error: TrackerError) -> Self {
        let status = match error.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidState => StatusCode::CONFLICT,
            ErrorKind::MalformedInput => StatusCode::BAD_REQUEST,
            ErrorKind::PersistenceFailure | ErrorKind::Configuration => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let code = match &error {
            TrackerError::EmployeeNotFound { .. } | TrackerError::EmployeeNameNotFound { .. } => {
                "EMPLOYEE_NOT_FOUND"
            }
            TrackerError::TimeEntryNotFound { .. } => "TIME_ENTRY_NOT_FOUND",
            TrackerError::AlreadyClockedIn { .. } => "ALREADY_CLOCKED_IN",
            TrackerError::NotClockedIn { .. } => "NOT_CLOCKED_IN",
            TrackerError::MultipleOpenEntries { .. } => "MULTIPLE_OPEN_ENTRIES",
            TrackerError::DuplicateEmployee { .. } => "DUPLICATE_EMPLOYEE",
            TrackerError::DuplicateTimeEntry { .. } => "DUPLICATE_TIME_ENTRY",
            TrackerError::NoEmployeeSelected => "NO_EMPLOYEE_SELECTED",
            TrackerError::Payload(_) => "INVALID_QR_PAYLOAD",
            TrackerError::InvalidTimeEntry { .. } => "INVALID_TIME_ENTRY",
            TrackerError::Storage { .. } => "STORAGE_ERROR",
            TrackerError::ConfigNotFound { .. } | TrackerError::ConfigParseError { .. } => {
                "CONFIG_ERROR"
            }
        };

        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            ApiError::with_details(code, "Internal error", error.to_string())
        } else {
            ApiError::new(code, error.to_string())
        };

        ApiErrorResponse { status, error }
    }
}

/// A time entry with its derived figures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryView {
    /// The stored entry.
    #[serde(flatten)]
    pub entry: TimeEntry,
    /// Worked hours, zero while open.
    #[serde(with = "rust_decimal::serde::float")]
    pub hours_worked: Decimal,
    /// Whether the entry crosses midnight.
    pub is_night_shift: bool,
    /// Display form of the hours, e.g. `7.50 hrs`.
    pub formatted_hours: String,
}

impl From<TimeEntry> for TimeEntryView {
    fn from(entry: TimeEntry) -> Self {
        Self {
            hours_worked: entry.hours_worked(),
            is_night_shift: entry.is_night_shift(),
            formatted_hours: entry.formatted_hours(),
            entry,
        }
    }
}

/// An employee with their totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeView {
    /// The stored employee.
    #[serde(flatten)]
    pub employee: Employee,
    /// Hours across every entry.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_hours: Decimal,
    /// Hours on entries that started today.
    #[serde(with = "rust_decimal::serde::float")]
    pub today_hours: Decimal,
    /// Whether an entry is open.
    pub is_clocked_in: bool,
}

impl EmployeeView {
    /// Builds the view, computing today's hours against `today`.
    pub fn new(employee: Employee, today: NaiveDate) -> Self {
        Self {
            total_hours: employee.total_hours(),
            today_hours: employee.today_hours(today),
            is_clocked_in: employee.is_clocked_in(),
            employee,
        }
    }
}

/// Rendered QR payload text.
#[derive(Debug, Clone, Serialize)]
pub struct QrView {
    /// The payload `type`.
    pub kind: &'static str,
    /// The text to render into a code.
    pub content: String,
}

/// Result of `POST /qr/scan`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanView {
    /// What the scan did.
    #[serde(flatten)]
    pub outcome: ScanOutcome,
    /// User-facing description.
    pub message: String,
}

impl From<ScanOutcome> for ScanView {
    fn from(outcome: ScanOutcome) -> Self {
        Self {
            message: outcome.message(),
            outcome,
        }
    }
}
