//! QR payload schema.
//!
//! A payload is a JSON object whose `type` field selects one of three kinds:
//!
//! ```text
//! employee   id, name, employeeType
//! timeEntry  id, employeeName, clockIn, clockOut ("" while open), breakMinutes
//! summary    employeeId, employeeName, totalHours, todayHours
//! ```
//!
//! Generated payloads also carry `hoursWorked` (time entries) and
//! `entryCount` (summaries). Those are informational and optional on decode.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::PayloadError;
use crate::models::timestamp::{format_iso, parse_iso};
use crate::models::{Employee, EmployeeType, TimeEntry};

/// Identifies an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCard {
    /// Employee id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Type, encoded by display name.
    #[serde(serialize_with = "display_name")]
    pub employee_type: EmployeeType,
}

/// Carries one time entry, addressed to its employee by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryCard {
    /// Entry id.
    pub id: String,
    /// Name of the owning employee.
    pub employee_name: String,
    /// Clock-in instant.
    #[serde(serialize_with = "iso")]
    pub clock_in: NaiveDateTime,
    /// Clock-out instant; encoded as `""` while open.
    #[serde(serialize_with = "iso_or_empty")]
    pub clock_out: Option<NaiveDateTime>,
    /// Unpaid break minutes.
    pub break_minutes: u32,
    /// Informational worked hours.
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub hours_worked: Option<Decimal>,
}

/// Informational hours summary for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCard {
    /// Employee id.
    pub employee_id: String,
    /// Display name.
    pub employee_name: String,
    /// Hours over all entries.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_hours: Decimal,
    /// Hours attributed to the day the code was generated.
    #[serde(with = "rust_decimal::serde::float")]
    pub today_hours: Decimal,
    /// Informational number of entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
}

/// A decoded or to-be-encoded QR payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QrPayload {
    /// `"type": "employee"`
    Employee(EmployeeCard),
    /// `"type": "timeEntry"`
    TimeEntry(TimeEntryCard),
    /// `"type": "summary"`
    Summary(SummaryCard),
}

impl QrPayload {
    /// Builds an employee payload.
    pub fn for_employee(employee: &Employee) -> Self {
        QrPayload::Employee(EmployeeCard {
            id: employee.id.clone(),
            name: employee.name.clone(),
            employee_type: employee.employee_type,
        })
    }

    /// Builds a time-entry payload for an entry of `employee_name`.
    pub fn for_time_entry(entry: &TimeEntry, employee_name: &str) -> Self {
        QrPayload::TimeEntry(TimeEntryCard {
            id: entry.id.clone(),
            employee_name: employee_name.to_string(),
            clock_in: entry.clock_in_time,
            clock_out: entry.clock_out_time,
            break_minutes: entry.break_minutes,
            hours_worked: Some(entry.hours_worked()),
        })
    }

    /// Builds a summary payload with today's hours as of `today`.
    pub fn for_summary(employee: &Employee, today: NaiveDate) -> Self {
        QrPayload::Summary(SummaryCard {
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            total_hours: employee.total_hours(),
            today_hours: employee.today_hours(today),
            entry_count: Some(employee.time_entries.len()),
        })
    }

    /// The `type` discriminator of this payload.
    pub fn kind(&self) -> &'static str {
        match self {
            QrPayload::Employee(_) => "employee",
            QrPayload::TimeEntry(_) => "timeEntry",
            QrPayload::Summary(_) => "summary",
        }
    }

    /// Renders the payload text to embed in a code.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parses and validates scanned payload text.
    ///
    /// # Errors
    ///
    /// - `InvalidJson` if the text is not a JSON object
    /// - `UnknownType` if `type` names no known kind
    /// - `MissingField` if a required field is absent or null
    /// - `InvalidField` if a field has the wrong JSON type
    /// - `InvalidTimestamp` if `clockIn`/`clockOut` is not a local date-time
    ///
    /// # Example
    ///
    /// ```
    /// use timesheet_tracker::models::EmployeeType;
    /// use timesheet_tracker::qr::QrPayload;
    ///
    /// let payload = QrPayload::decode(
    ///     r#"{"type": "employee", "id": "e1", "name": "Ada", "employeeType": "Chief"}"#,
    /// ).unwrap();
    /// match payload {
    ///     QrPayload::Employee(card) => assert_eq!(card.employee_type, EmployeeType::Staff),
    ///     _ => unreachable!(),
    /// }
    /// ```
    pub fn decode(text: &str) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_str(text).map_err(|e| PayloadError::InvalidJson {
            message: e.to_string(),
        })?;
        let object = value.as_object().ok_or_else(|| PayloadError::InvalidJson {
            message: "expected a JSON object".to_string(),
        })?;

        match required_str(object, "type")? {
            "employee" => decode_employee(object),
            "timeEntry" => decode_time_entry(object),
            "summary" => decode_summary(object),
            other => Err(PayloadError::UnknownType {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for QrPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

fn decode_employee(object: &Map<String, Value>) -> Result<QrPayload, PayloadError> {
    let employee_type = required_str(object, "employeeType")?;
    Ok(QrPayload::Employee(EmployeeCard {
        id: required_str(object, "id")?.to_string(),
        name: required_str(object, "name")?.to_string(),
        employee_type: EmployeeType::from_display_name(employee_type).unwrap_or_default(),
    }))
}

fn decode_time_entry(object: &Map<String, Value>) -> Result<QrPayload, PayloadError> {
    let clock_in = required_timestamp(object, "clockIn")?;
    let clock_out = match required_str(object, "clockOut")? {
        "" => None,
        raw => Some(parse_iso(raw).ok_or_else(|| PayloadError::InvalidTimestamp {
            field: "clockOut".to_string(),
            value: raw.to_string(),
        })?),
    };

    let break_minutes = required(object, "breakMinutes")?
        .as_u64()
        .and_then(|minutes| u32::try_from(minutes).ok())
        .ok_or_else(|| PayloadError::InvalidField {
            field: "breakMinutes".to_string(),
            message: "expected a non-negative integer".to_string(),
        })?;

    Ok(QrPayload::TimeEntry(TimeEntryCard {
        id: required_str(object, "id")?.to_string(),
        employee_name: required_str(object, "employeeName")?.to_string(),
        clock_in,
        clock_out,
        break_minutes,
        hours_worked: object.get("hoursWorked").and_then(as_decimal),
    }))
}

fn decode_summary(object: &Map<String, Value>) -> Result<QrPayload, PayloadError> {
    Ok(QrPayload::Summary(SummaryCard {
        employee_id: required_str(object, "employeeId")?.to_string(),
        employee_name: required_str(object, "employeeName")?.to_string(),
        total_hours: required_decimal(object, "totalHours")?,
        today_hours: required_decimal(object, "todayHours")?,
        entry_count: object
            .get("entryCount")
            .and_then(Value::as_u64)
            .and_then(|count| usize::try_from(count).ok()),
    }))
}

fn required<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a Value, PayloadError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(PayloadError::MissingField {
            field: field.to_string(),
        }),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a str, PayloadError> {
    required(object, field)?
        .as_str()
        .ok_or_else(|| PayloadError::InvalidField {
            field: field.to_string(),
            message: "expected a string".to_string(),
        })
}

fn required_timestamp(object: &Map<String, Value>, field: &str) -> Result<NaiveDateTime, PayloadError> {
    let raw = required_str(object, field)?;
    parse_iso(raw).ok_or_else(|| PayloadError::InvalidTimestamp {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

fn required_decimal(object: &Map<String, Value>, field: &str) -> Result<Decimal, PayloadError> {
    as_decimal(required(object, field)?).ok_or_else(|| PayloadError::InvalidField {
        field: field.to_string(),
        message: "expected a number".to_string(),
    })
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    if !value.is_number() {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}

fn display_name<S: Serializer>(value: &EmployeeType, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.display_name())
}

fn iso<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_iso(value))
}

fn iso_or_empty<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.serialize_str(&format_iso(value)),
        None => serializer.serialize_str(""),
    }
}
