//! Storage layer for the bug tracker.
//!
//! This module provides the persistence layer using a JSON file with:
//! - Full-file atomic rewrites on every mutation
//! - Validating load (bad entries are dropped, not trusted)
//! - Change listeners for views
//!
//! # Submodules
//!
//! - [`store`] - The bug store
//! - [`json`] - Store file encoding and validation
//! - [`events`] - Listener registration and change events
//! - [`source`] - Source line lookup for code snapshots

pub mod events;
pub mod json;
pub mod source;
pub mod store;

pub use events::{ListenerId, StoreEvent};
pub use json::{LoadReport, RejectedEntry};
pub use source::{FsLineSource, LineSource};
pub use store::{BugStore, MergeOutcome, NewBug};
