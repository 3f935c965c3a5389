//! Request types for the tracker API.
//!
//! Manual time-entry bodies deserialize straight into
//! [`ManualEntry`](crate::store::ManualEntry) and full employee records into
//! [`Employee`](crate::models::Employee); the types here cover the rest.

use serde::{Deserialize, Serialize};

use crate::models::EmployeeType;

/// Request body for `POST /employees`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddEmployeeRequest {
    /// Display name; must not be blank.
    pub name: String,
    /// Reporting classification, `STAFF` when omitted.
    #[serde(rename = "type", default)]
    pub employee_type: EmployeeType,
}

/// Request body for `POST /employees/:id/clock-out`.
///
/// The body itself is optional; a missing break falls back to the
/// configured default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockOutRequest {
    /// Unpaid break minutes.
    #[serde(default)]
    pub break_minutes: Option<u32>,
}

/// Request body for `POST /qr/scan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// The raw text read from the code.
    pub content: String,
}

/// Query string for `GET /employees/lookup`.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupQuery {
    /// Exact employee name.
    pub name: String,
}

/// Which payload `GET /employees/:id/qr` renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrKind {
    /// Identifies the employee.
    #[default]
    Employee,
    /// The employee's hour totals.
    Summary,
}

/// Query string for `GET /employees/:id/qr`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QrQuery {
    /// Payload kind, `employee` when omitted.
    #[serde(default)]
    pub kind: QrKind,
}
