//! QR payload codec and scan handling.
//!
//! Only the text schema lives here; rendering the text into an image and
//! reading it back from a camera are left to the presentation layer.

mod payload;
mod scanner;

pub use payload::{EmployeeCard, QrPayload, SummaryCard, TimeEntryCard};
pub use scanner::{
    DEFAULT_SCAN_COOLDOWN, ScanDebouncer, ScanOutcome, ScanSession, apply_payload, process_scan,
};
