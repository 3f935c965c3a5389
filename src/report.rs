//! Aggregate hours reporting.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::models::EmployeeType;
use crate::store::{EmployeeStore, Refreshable};

/// Hours totals across the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoursReport {
    /// The date the report was built on.
    pub date: NaiveDate,
    /// Hours over every employee.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_hours: Decimal,
    /// Hours today over every employee.
    #[serde(with = "rust_decimal::serde::float")]
    pub today_hours: Decimal,
    /// Hours per employee type; types without employees are absent.
    #[serde(serialize_with = "hours_by_type")]
    pub by_type: BTreeMap<EmployeeType, Decimal>,
}

impl HoursReport {
    /// Builds a report from the current store contents.
    pub fn build(store: &EmployeeStore) -> Self {
        let date = store.today();
        let employees = store.all_employees();
        Self {
            date,
            total_hours: employees.iter().map(|e| e.total_hours()).sum(),
            today_hours: employees.iter().map(|e| e.today_hours(date)).sum(),
            by_type: store.total_hours_by_type(),
        }
    }

    /// Hours for one type, zero when no employee has that type.
    pub fn hours_for(&self, employee_type: EmployeeType) -> Decimal {
        self.by_type
            .get(&employee_type)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

fn hours_by_type<S: Serializer>(
    by_type: &BTreeMap<EmployeeType, Decimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(by_type.len()))?;
    for (employee_type, hours) in by_type {
        map.serialize_entry(employee_type, &hours.to_f64().unwrap_or_default())?;
    }
    map.end()
}

/// Summary screen model kept current through [`Refreshable`].
#[derive(Debug, Clone, Default)]
pub struct SummaryView {
    report: Option<HoursReport>,
    employee_count: usize,
}

impl SummaryView {
    /// Creates a view already populated from `store`.
    pub fn new(store: &EmployeeStore) -> Self {
        let mut view = Self::default();
        view.refresh(store);
        view
    }

    /// The latest report, if the view has been refreshed at least once.
    pub fn report(&self) -> Option<&HoursReport> {
        self.report.as_ref()
    }

    /// Number of employees at the last refresh.
    pub fn employee_count(&self) -> usize {
        self.employee_count
    }

    /// Total hours, e.g. `8.00 hours`.
    pub fn formatted_total_hours(&self) -> String {
        let total = self
            .report
            .as_ref()
            .map_or(Decimal::ZERO, |r| r.total_hours);
        format!("{:.2} hours", total)
    }

    /// Hours for one type, e.g. `0.00 hours` for a type without employees.
    pub fn formatted_hours_for(&self, employee_type: EmployeeType) -> String {
        let hours = self
            .report
            .as_ref()
            .map_or(Decimal::ZERO, |r| r.hours_for(employee_type));
        format!("{:.2} hours", hours)
    }
}

impl Refreshable for SummaryView {
    fn refresh(&mut self, store: &EmployeeStore) {
        self.report = Some(HoursReport::build(store));
        self.employee_count = store.len();
        debug!(
            employees = self.employee_count,
            total = %self.formatted_total_hours(),
            "Summary refreshed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, NaiveDateTime};

    use crate::clock::FixedClock;
    use crate::store::refresh_on_change;

    fn create_test_store() -> (EmployeeStore, Arc<FixedClock>) {
        let start = NaiveDateTime::parse_from_str("2024-01-10 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let clock = Arc::new(FixedClock::new(start));
        (EmployeeStore::in_memory(clock.clone()), clock)
    }

    #[test]
    fn test_report_on_empty_store() {
        let (store, _) = create_test_store();
        let report = HoursReport::build(&store);
        assert_eq!(report.total_hours, Decimal::ZERO);
        assert!(report.by_type.is_empty());
        assert_eq!(report.hours_for(EmployeeType::Manager), Decimal::ZERO);
    }

    #[test]
    fn test_report_totals() {
        let (store, clock) = create_test_store();
        let staff = store.add_employee("A", EmployeeType::Staff).unwrap();
        let contractor = store.add_employee("B", EmployeeType::Contractor).unwrap();
        store.clock_in(&staff.id).unwrap();
        store.clock_in(&contractor.id).unwrap();
        clock.advance(Duration::hours(2));
        store.clock_out(&staff.id, 0).unwrap();
        store.clock_out(&contractor.id, 30).unwrap();

        let report = HoursReport::build(&store);
        assert_eq!(report.total_hours, Decimal::new(35, 1));
        assert_eq!(report.today_hours, Decimal::new(35, 1));
        assert_eq!(report.hours_for(EmployeeType::Staff), Decimal::from(2));
        assert_eq!(report.hours_for(EmployeeType::Contractor), Decimal::new(15, 1));
        assert!(!report.by_type.contains_key(&EmployeeType::Temporary));
    }

    #[test]
    fn test_summary_view_refreshes_from_events() {
        let (store, clock) = create_test_store();
        let mut view = SummaryView::new(&store);
        let mut events = store.subscribe();
        assert_eq!(view.formatted_total_hours(), "0.00 hours");

        let staff = store.add_employee("A", EmployeeType::Staff).unwrap();
        store.clock_in(&staff.id).unwrap();
        clock.advance(Duration::hours(8));
        store.clock_out(&staff.id, 0).unwrap();

        store.refresh_pending(&mut events, &mut view);
        assert_eq!(view.employee_count(), 1);
        assert_eq!(view.formatted_total_hours(), "8.00 hours");
        assert_eq!(view.formatted_hours_for(EmployeeType::Staff), "8.00 hours");
        assert_eq!(view.formatted_hours_for(EmployeeType::Manager), "0.00 hours");
    }

    #[tokio::test]
    async fn test_summary_view_follows_live_store() {
        let (store, clock) = create_test_store();
        let store = Arc::new(store);
        let events = store.subscribe();
        let watcher = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let mut view = SummaryView::new(&store);
                // The store outlives the watcher, so the loop only ends on timeout.
                let _ = tokio::time::timeout(
                    std::time::Duration::from_millis(200),
                    refresh_on_change(&store, events, &mut view),
                )
                .await;
                view
            })
        };

        let staff = store.add_employee("A", EmployeeType::Staff).unwrap();
        store.clock_in(&staff.id).unwrap();
        clock.advance(Duration::hours(8));
        store.clock_out(&staff.id, 0).unwrap();

        let view = watcher.await.unwrap();
        assert_eq!(view.employee_count(), 1);
        assert_eq!(view.formatted_total_hours(), "8.00 hours");
    }

    #[test]
    fn test_report_serializes_type_keys() {
        let (store, _) = create_test_store();
        store.add_employee("A", EmployeeType::Temporary).unwrap();
        let json = serde_json::to_value(HoursReport::build(&store)).unwrap();
        assert_eq!(json["date"], "2024-01-10");
        assert_eq!(json["byType"]["TEMP"], 0.0);
    }
}
