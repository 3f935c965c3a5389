//! Performance benchmarks for the timesheet tracker.
//!
//! Covers the hot paths of a busy store:
//! - Hours aggregation by employee type over a populated store
//! - Clock-in/clock-out cycles, each persisting the whole collection
//! - QR payload decode
//! - The hours report over HTTP
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use timesheet_tracker::api::{AppState, create_router};
use timesheet_tracker::clock::FixedClock;
use timesheet_tracker::config::TrackerConfig;
use timesheet_tracker::models::{EmployeeType, TimeEntry};
use timesheet_tracker::qr::QrPayload;
use timesheet_tracker::storage::FileStorage;
use timesheet_tracker::store::{EmployeeStore, ManualEntry, StoreOptions};

use axum::{body::Body, http::Request};
use tower::ServiceExt;

fn start() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2024-01-10 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Creates an in-memory store with `employees` employees, each holding
/// `entries` closed eight-hour entries on consecutive days.
fn create_populated_store(employees: usize, entries: usize) -> EmployeeStore {
    let store = EmployeeStore::in_memory(Arc::new(FixedClock::new(start())));
    for i in 0..employees {
        let employee_type = EmployeeType::ALL[i % EmployeeType::ALL.len()];
        let employee = store
            .add_employee(format!("Employee {:04}", i), employee_type)
            .unwrap();
        for day in 0..entries {
            let clock_in = start() - Duration::days(day as i64 + 1);
            store
                .add_time_entry(
                    &employee.id,
                    ManualEntry {
                        clock_in,
                        clock_out: Some(clock_in + Duration::hours(8)),
                        break_minutes: 30,
                    },
                )
                .unwrap();
        }
    }
    store
}

/// Benchmark: hours by type across store sizes.
fn bench_total_hours_by_type(c: &mut Criterion) {
    let mut group = c.benchmark_group("total_hours_by_type");

    for employees in [10usize, 100, 500] {
        let store = create_populated_store(employees, 14);
        group.throughput(Throughput::Elements((employees * 14) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(employees), &store, |b, store| {
            b.iter(|| black_box(store.total_hours_by_type()))
        });
    }

    group.finish();
}

/// Benchmark: one clock-in/clock-out cycle against file storage.
///
/// Each call rewrites the whole collection, so cost grows with store size.
fn bench_clock_cycle_persisted(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock_cycle_persisted");

    for employees in [10usize, 100] {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(FixedClock::new(start()));
        let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
        let store = EmployeeStore::open(storage, clock.clone(), StoreOptions::default());
        let mut ids = Vec::with_capacity(employees);
        for i in 0..employees {
            ids.push(
                store
                    .add_employee(format!("Employee {:04}", i), EmployeeType::Staff)
                    .unwrap()
                    .id,
            );
        }

        group.bench_with_input(BenchmarkId::from_parameter(employees), &ids[0], |b, id| {
            b.iter(|| {
                store.clock_in(id).unwrap();
                clock.advance(Duration::minutes(1));
                black_box(store.clock_out(id, 0).unwrap())
            })
        });
    }

    group.finish();
}

/// Benchmark: decoding a time-entry payload.
fn bench_decode_time_entry(c: &mut Criterion) {
    let entry = TimeEntry::with_span(start(), Some(start() + Duration::hours(9)), 45);
    let text = QrPayload::for_time_entry(&entry, "Employee 0001").encode();

    c.bench_function("decode_time_entry", |b| {
        b.iter(|| black_box(QrPayload::decode(black_box(&text)).unwrap()))
    });
}

/// Benchmark: GET /reports/hours through the router.
fn bench_hours_report_endpoint(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(create_populated_store(100, 14));
    let router = create_router(AppState::new(store, TrackerConfig::default()));

    c.bench_function("hours_report_endpoint", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(
                    Request::builder()
                        .method("GET")
                        .uri("/reports/hours")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            black_box(response)
        })
    });
}

criterion_group!(
    benches,
    bench_total_hours_by_type,
    bench_clock_cycle_persisted,
    bench_decode_time_entry,
    bench_hours_report_endpoint
);
criterion_main!(benches);
