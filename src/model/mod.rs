//! Data models for the bug tracker.
//!
//! This module contains the domain model:
//! - BugRecord
//! - Severity / Status
//! - Location
//! - StatusCounts

pub mod bug;

pub use bug::{
    BugRecord, Location, Severity, Status, StatusCounts, format_timestamp, new_bug_id, now_millis,
    parse_timestamp,
};
