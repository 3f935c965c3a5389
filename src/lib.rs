//! Timesheet tracking engine.
//!
//! This crate records employees and their clock-in/clock-out time entries,
//! computes worked hours (including overnight shifts), persists the whole
//! collection through a pluggable key-value backend, and exchanges employees,
//! entries and summaries as QR payload text. An axum router exposes the
//! same operations over HTTP.

#![warn(missing_docs)]

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod qr;
pub mod report;
pub mod storage;
pub mod store;
