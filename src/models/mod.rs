//! Core data models for the timesheet tracker.
//!
//! This module contains the domain models shared by the store, the QR
//! payload codec and the HTTP surface.

mod employee;
mod time_entry;
pub mod timestamp;

pub use employee::{Employee, EmployeeType};
pub use time_entry::{TimeEntry, roll_overnight};
