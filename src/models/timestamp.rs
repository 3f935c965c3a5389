//! Local date-time text formats shared by persistence, QR payloads and display.

use chrono::NaiveDateTime;

/// ISO-8601 local date-time with whole seconds, e.g. `2024-01-10T22:00:00`.
pub const ISO_LOCAL: &str = "%Y-%m-%dT%H:%M:%S";

/// Minute-precision ISO-8601 form emitted when seconds are zero.
const ISO_LOCAL_MINUTES: &str = "%Y-%m-%dT%H:%M";

/// Display pattern for times of day, e.g. `10:00 PM`.
pub const TIME_OF_DAY: &str = "%-I:%M %p";

/// Display pattern for calendar dates, e.g. `Jan 10, 2024`.
pub const CALENDAR_DATE: &str = "%b %-d, %Y";

/// Display pattern for date plus time, e.g. `Jan 10, 2024 at 10:00 PM`.
pub const DATE_AT_TIME: &str = "%b %-d, %Y at %-I:%M %p";

/// Formats a timestamp as `yyyy-MM-ddTHH:mm:ss`.
pub fn format_iso(value: &NaiveDateTime) -> String {
    value.format(ISO_LOCAL).to_string()
}

/// Parses an ISO-8601 local date-time.
///
/// Accepts fractional seconds and the minute-precision form
/// (`2024-01-10T22:00`). Returns `None` for anything else.
///
/// # Examples
///
/// ```
/// use timesheet_tracker::models::timestamp::parse_iso;
///
/// assert!(parse_iso("2024-01-10T22:00:00").is_some());
/// assert!(parse_iso("2024-01-10T22:00").is_some());
/// assert!(parse_iso("10/01/2024 22:00").is_none());
/// ```
pub fn parse_iso(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, ISO_LOCAL_MINUTES))
        .ok()
}

/// Serde adapter writing timestamps as `yyyy-MM-ddTHH:mm:ss`.
///
/// Reading accepts everything [`parse_iso`] accepts. Use with
/// `#[serde(with = "iso_local")]`, or [`iso_local::option`] for optional fields.
pub mod iso_local {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::{format_iso, parse_iso};

    /// Serializes a timestamp.
    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_iso(value))
    }

    /// Deserializes a timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_iso(&raw).ok_or_else(|| D::Error::custom(format!("invalid local date-time: {raw}")))
    }

    /// The same format for `Option<NaiveDateTime>`; `None` is `null`.
    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        use super::super::{format_iso, parse_iso};

        /// Serializes an optional timestamp.
        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_some(&format_iso(value)),
                None => serializer.serialize_none(),
            }
        }

        /// Deserializes an optional timestamp.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse_iso(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid local date-time: {raw}"))),
                None => Ok(None),
            }
        }
    }
}
