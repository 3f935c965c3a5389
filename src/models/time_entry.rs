//! Time entry model.
//!
//! A [`TimeEntry`] is a single clock-in/clock-out span. An entry without a
//! clock-out time is *open*: its employee is still clocked in.

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::timestamp::{CALENDAR_DATE, DATE_AT_TIME, TIME_OF_DAY, iso_local};
use crate::error::{TrackerError, TrackerResult};

/// Represents one clock-in/clock-out span with a break deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    /// Unique identifier, generated at creation.
    pub id: String,
    /// When the employee clocked in.
    #[serde(with = "iso_local")]
    pub clock_in_time: NaiveDateTime,
    /// When the employee clocked out; `None` while the entry is open.
    #[serde(default, with = "iso_local::option")]
    pub clock_out_time: Option<NaiveDateTime>,
    /// Unpaid break minutes deducted from the worked duration.
    #[serde(default)]
    pub break_minutes: u32,
}

impl TimeEntry {
    /// Creates an open entry with a freshly generated id.
    pub fn open(clock_in_time: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            clock_in_time,
            clock_out_time: None,
            break_minutes: 0,
        }
    }

    /// Creates an entry with a freshly generated id and the given span.
    pub fn with_span(
        clock_in_time: NaiveDateTime,
        clock_out_time: Option<NaiveDateTime>,
        break_minutes: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            clock_in_time,
            clock_out_time,
            break_minutes,
        }
    }

    /// Returns true while the entry has no clock-out time.
    pub fn is_open(&self) -> bool {
        self.clock_out_time.is_none()
    }

    /// Closes the entry.
    pub fn close(&mut self, clock_out_time: NaiveDateTime, break_minutes: u32) {
        self.clock_out_time = Some(clock_out_time);
        self.break_minutes = break_minutes;
    }

    /// Returns the worked minutes, or `None` for an open entry.
    ///
    /// Elapsed time is measured between full timestamps, so spans across
    /// midnight (or several days) count correctly. A clock-out before the
    /// clock-in counts as zero elapsed minutes. The break is subtracted
    /// after that clamp and the result is not clamped again, so a break
    /// longer than the shift yields a negative value.
    pub fn worked_minutes(&self) -> Option<i64> {
        let clock_out = self.clock_out_time?;
        let elapsed = (clock_out - self.clock_in_time).num_minutes().max(0);
        Some(elapsed - i64::from(self.break_minutes))
    }

    /// Calculates the worked hours for the entry.
    ///
    /// # Returns
    ///
    /// Zero for an open entry, otherwise worked minutes divided by 60.
    ///
    /// # Examples
    ///
    /// ```
    /// use timesheet_tracker::models::TimeEntry;
    /// use chrono::NaiveDateTime;
    /// use rust_decimal::Decimal;
    ///
    /// let entry = TimeEntry {
    ///     id: "t1".to_string(),
    ///     clock_in_time: NaiveDateTime::parse_from_str("2024-01-10 22:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
    ///     clock_out_time: Some(NaiveDateTime::parse_from_str("2024-01-11 06:00:00", "%Y-%m-%d %H:%M:%S").unwrap()),
    ///     break_minutes: 30,
    /// };
    /// assert_eq!(entry.hours_worked(), Decimal::new(75, 1)); // 7.5 hours
    /// assert!(entry.is_night_shift());
    /// ```
    pub fn hours_worked(&self) -> Decimal {
        match self.worked_minutes() {
            Some(minutes) => Decimal::from(minutes) / Decimal::from(60),
            None => Decimal::ZERO,
        }
    }

    /// Returns true if the entry is closed on a different calendar date
    /// than it was opened.
    pub fn is_night_shift(&self) -> bool {
        self.clock_out_time
            .is_some_and(|clock_out| clock_out.date() != self.clock_in_time.date())
    }

    /// Clock-in time of day, e.g. `10:00 PM`.
    pub fn formatted_clock_in_time(&self) -> String {
        self.clock_in_time.format(TIME_OF_DAY).to_string()
    }

    /// Clock-out time of day, or an empty string while open.
    pub fn formatted_clock_out_time(&self) -> String {
        self.clock_out_time
            .map(|t| t.format(TIME_OF_DAY).to_string())
            .unwrap_or_default()
    }

    /// Calendar date of the entry; night shifts show both dates.
    ///
    /// ```text
    /// Jan 10, 2024
    /// Jan 10, 2024 → Jan 11, 2024
    /// ```
    pub fn formatted_date(&self) -> String {
        let start = self.clock_in_time.format(CALENDAR_DATE).to_string();
        match self.clock_out_time {
            Some(end) if self.is_night_shift() => {
                format!("{} → {}", start, end.format(CALENDAR_DATE))
            }
            _ => start,
        }
    }

    /// Worked hours with two decimals; night shifts carry a trailing marker.
    pub fn formatted_hours(&self) -> String {
        let hours = self.hours_worked();
        if self.is_night_shift() {
            format!("{:.2} hrs ⏱️", hours)
        } else {
            format!("{:.2} hrs", hours)
        }
    }

    /// Clock-in date and time, e.g. `Jan 10, 2024 at 10:00 PM`.
    pub fn formatted_clock_in_date_time(&self) -> String {
        self.clock_in_time.format(DATE_AT_TIME).to_string()
    }

    /// Clock-out date and time, or an empty string while open.
    pub fn formatted_clock_out_date_time(&self) -> String {
        self.clock_out_time
            .map(|t| t.format(DATE_AT_TIME).to_string())
            .unwrap_or_default()
    }
}

/// Rolls a clock-out that precedes its clock-in forward by one day.
///
/// Entries typed in as two times of day on one date describe an overnight
/// shift when the clock-out is earlier than the clock-in.
///
/// # Errors
///
/// `InvalidTimeEntry` if the next day is past the representable range.
pub fn roll_overnight(
    clock_in_time: NaiveDateTime,
    clock_out_time: Option<NaiveDateTime>,
) -> TrackerResult<Option<NaiveDateTime>> {
    match clock_out_time {
        Some(clock_out) if clock_out < clock_in_time => clock_out
            .checked_add_signed(Duration::days(1))
            .map(Some)
            .ok_or_else(|| TrackerError::InvalidTimeEntry {
                message: format!("clock-out {} cannot be moved to the next day", clock_out),
            }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn closed(clock_in: NaiveDateTime, clock_out: NaiveDateTime, break_minutes: u32) -> TimeEntry {
        TimeEntry {
            id: "t1".to_string(),
            clock_in_time: clock_in,
            clock_out_time: Some(clock_out),
            break_minutes,
        }
    }

    #[test]
    fn test_open_entry_has_zero_hours() {
        let entry = TimeEntry::open(make_datetime("2024-01-10", "09:00:00"));
        assert!(entry.is_open());
        assert_eq!(entry.hours_worked(), Decimal::ZERO);
        assert_eq!(entry.worked_minutes(), None);
        assert!(!entry.is_night_shift());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let at = make_datetime("2024-01-10", "09:00:00");
        assert_ne!(TimeEntry::open(at).id, TimeEntry::open(at).id);
    }

    #[test]
    fn test_day_shift_with_break() {
        let entry = closed(
            make_datetime("2024-01-10", "09:00:00"),
            make_datetime("2024-01-10", "17:30:00"),
            30,
        );
        assert_eq!(entry.hours_worked(), Decimal::new(80, 1));
        assert!(!entry.is_night_shift());
    }

    #[test]
    fn test_overnight_shift_with_break() {
        let entry = closed(
            make_datetime("2024-01-10", "22:00:00"),
            make_datetime("2024-01-11", "06:00:00"),
            30,
        );
        assert_eq!(entry.hours_worked(), Decimal::new(75, 1));
        assert!(entry.is_night_shift());
    }

    #[test]
    fn test_multi_day_span() {
        let entry = closed(
            make_datetime("2024-01-10", "08:00:00"),
            make_datetime("2024-01-12", "08:00:00"),
            0,
        );
        assert_eq!(entry.hours_worked(), Decimal::from(48));
        assert!(entry.is_night_shift());
    }

    #[test]
    fn test_clock_out_before_clock_in_clamps_elapsed() {
        let entry = closed(
            make_datetime("2024-01-10", "17:00:00"),
            make_datetime("2024-01-10", "09:00:00"),
            0,
        );
        assert_eq!(entry.hours_worked(), Decimal::ZERO);
    }

    #[test]
    fn test_break_longer_than_shift_goes_negative() {
        let entry = closed(
            make_datetime("2024-01-10", "09:00:00"),
            make_datetime("2024-01-10", "09:30:00"),
            60,
        );
        assert_eq!(entry.worked_minutes(), Some(-30));
        assert_eq!(entry.hours_worked(), Decimal::new(-5, 1));
    }

    #[test]
    fn test_reversed_span_with_break_is_negative_break() {
        let entry = closed(
            make_datetime("2024-01-10", "17:00:00"),
            make_datetime("2024-01-10", "09:00:00"),
            30,
        );
        assert_eq!(entry.hours_worked(), Decimal::new(-5, 1));
    }

    #[test]
    fn test_close_sets_clock_out_and_break() {
        let mut entry = TimeEntry::open(make_datetime("2024-01-10", "09:00:00"));
        entry.close(make_datetime("2024-01-10", "12:00:00"), 15);
        assert!(!entry.is_open());
        assert_eq!(entry.break_minutes, 15);
        assert_eq!(entry.hours_worked(), Decimal::new(275, 2));
    }

    #[test]
    fn test_formatted_date_for_day_shift() {
        let entry = closed(
            make_datetime("2024-01-10", "09:00:00"),
            make_datetime("2024-01-10", "17:00:00"),
            0,
        );
        assert_eq!(entry.formatted_date(), "Jan 10, 2024");
        assert_eq!(entry.formatted_hours(), "8.00 hrs");
    }

    #[test]
    fn test_formatted_date_for_night_shift_shows_both_dates() {
        let entry = closed(
            make_datetime("2024-01-10", "22:00:00"),
            make_datetime("2024-01-11", "06:00:00"),
            30,
        );
        assert_eq!(entry.formatted_date(), "Jan 10, 2024 → Jan 11, 2024");
        assert_eq!(entry.formatted_hours(), "7.50 hrs ⏱️");
    }

    #[test]
    fn test_formatted_times() {
        let entry = closed(
            make_datetime("2024-01-10", "22:00:00"),
            make_datetime("2024-01-11", "06:15:00"),
            0,
        );
        assert_eq!(entry.formatted_clock_in_time(), "10:00 PM");
        assert_eq!(entry.formatted_clock_out_time(), "6:15 AM");
        assert_eq!(
            entry.formatted_clock_in_date_time(),
            "Jan 10, 2024 at 10:00 PM"
        );
        assert_eq!(
            entry.formatted_clock_out_date_time(),
            "Jan 11, 2024 at 6:15 AM"
        );
    }

    #[test]
    fn test_formatted_clock_out_empty_when_open() {
        let entry = TimeEntry::open(make_datetime("2024-01-10", "09:00:00"));
        assert_eq!(entry.formatted_clock_out_time(), "");
        assert_eq!(entry.formatted_clock_out_date_time(), "");
    }

    #[test]
    fn test_roll_overnight() {
        let clock_in = make_datetime("2024-01-10", "22:00:00");
        assert_eq!(
            roll_overnight(clock_in, Some(make_datetime("2024-01-10", "06:00:00"))).unwrap(),
            Some(make_datetime("2024-01-11", "06:00:00"))
        );
        assert_eq!(
            roll_overnight(clock_in, Some(make_datetime("2024-01-10", "23:00:00"))).unwrap(),
            Some(make_datetime("2024-01-10", "23:00:00"))
        );
        assert_eq!(roll_overnight(clock_in, None).unwrap(), None);
    }

    #[test]
    fn test_roll_overnight_past_last_day() {
        let clock_out = NaiveDateTime::MAX.date().and_hms_opt(0, 0, 0).unwrap();
        let err = roll_overnight(NaiveDateTime::MAX, Some(clock_out)).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidTimeEntry { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedInput);
    }

    #[test]
    fn test_persisted_timestamps_use_whole_seconds() {
        let entry: TimeEntry = serde_json::from_str(
            r#"{"id":"t1","clockInTime":"2024-01-10T22:00","clockOutTime":"2024-01-11T06:00:30.900","breakMinutes":30}"#,
        )
        .unwrap();
        assert_eq!(entry.clock_in_time, make_datetime("2024-01-10", "22:00:00"));

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["clockOutTime"], "2024-01-11T06:00:30");
    }

    #[test]
    fn test_serialization_uses_camel_case_and_null_for_open() {
        let entry = TimeEntry {
            id: "t1".to_string(),
            clock_in_time: make_datetime("2024-01-10", "22:00:00"),
            clock_out_time: None,
            break_minutes: 0,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["clockInTime"], "2024-01-10T22:00:00");
        assert!(json["clockOutTime"].is_null());
        assert_eq!(json["breakMinutes"], 0);

        let back: TimeEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    proptest! {
        #[test]
        fn prop_hours_match_minutes_minus_break(
            start_minute in 0i64..(60 * 24),
            duration in 1i64..(60 * 72),
            break_minutes in 0u32..600,
        ) {
            let clock_in = make_datetime("2024-01-10", "00:00:00") + Duration::minutes(start_minute);
            let entry = closed(clock_in, clock_in + Duration::minutes(duration), break_minutes);
            let expected = Decimal::from(duration - i64::from(break_minutes)) / Decimal::from(60);
            prop_assert_eq!(entry.hours_worked(), expected);
        }

        #[test]
        fn prop_night_shift_iff_dates_differ(
            start_minute in 0i64..(60 * 24),
            duration in 0i64..(60 * 48),
        ) {
            let clock_in = make_datetime("2024-01-10", "00:00:00") + Duration::minutes(start_minute);
            let clock_out = clock_in + Duration::minutes(duration);
            let entry = closed(clock_in, clock_out, 0);
            prop_assert_eq!(entry.is_night_shift(), clock_in.date() != clock_out.date());
        }
    }
}
