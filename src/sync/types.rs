//! Types for report import and export.

use std::path::PathBuf;

use serde::Serialize;

use crate::model::StatusCounts;

/// A report section that could not be turned into a bug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejected {
    /// The id from the section heading.
    pub id: String,
    /// Line of the heading (1-indexed).
    pub line: usize,
    pub reason: String,
}

/// Statistics for an import operation.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportStats {
    /// Ids of bugs added to the store.
    pub created: Vec<String>,
    /// Ids already present in the store.
    pub skipped: Vec<String>,
    /// Sections that failed to decode.
    pub rejected: Vec<Rejected>,
    /// Copy of the report taken before the store rewrote it, when the
    /// report held sections that did not decode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

impl ImportStats {
    /// Sections seen in the report.
    #[must_use]
    pub fn total_processed(&self) -> usize {
        self.created.len() + self.skipped.len() + self.rejected.len()
    }

    /// Returns true if the import changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
    }
}

/// Statistics for an export operation.
#[derive(Debug, Clone, Serialize)]
pub struct ExportStats {
    /// Number of bugs written.
    pub records: usize,
    /// Per-status tally shown in the summary.
    pub counts: StatusCounts,
    /// Where the report went.
    pub path: PathBuf,
    /// The report content was already up to date.
    pub unchanged: bool,
}

/// Report status information.
#[derive(Debug, Clone, Serialize)]
pub struct ReportStatus {
    /// Store file location.
    pub store_path: PathBuf,
    /// Bugs in the store.
    pub total: usize,
    pub counts: StatusCounts,
    /// Standalone bugs in the store.
    pub standalone: usize,
    /// Report file location, if one is configured.
    pub report_path: Option<PathBuf>,
    pub report_exists: bool,
    /// Report size in bytes.
    pub report_size: u64,
    /// The report no longer matches the store.
    pub report_stale: bool,
    /// Store entries dropped on load.
    pub rejected_on_load: usize,
}

/// Sync-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The export target is the store file itself.
    #[error("Refusing to write the report over the store file: {0}")]
    TargetIsStore(String),
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
