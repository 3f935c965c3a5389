//! HTTP API module for the tracker.
//!
//! This module exposes the employee store, clock actions, manual time
//! entries, QR generation and scanning, and the hours report as a REST API.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{AddEmployeeRequest, ClockOutRequest, LookupQuery, QrKind, QrQuery, ScanRequest};
pub use response::{ApiError, ApiErrorResponse, EmployeeView, QrView, ScanView, TimeEntryView};
pub use state::AppState;
