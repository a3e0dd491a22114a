//! Report export.
//!
//! Export renders the whole store as a markdown report (snapshot mode: the
//! file is the current state, not a log). A report whose content already
//! matches is left untouched so its mtime and the generation stamp only
//! move when a bug actually changed.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::model::StatusCounts;
use crate::storage::BugStore;
use crate::sync::file::{atomic_write, read_optional};
use crate::sync::hash::{has_changed, report_hash};
use crate::sync::render::render_report;
use crate::sync::types::{ExportStats, SyncError, SyncResult};

/// Exporter for markdown reports.
pub struct Exporter<'a> {
    store: &'a BugStore,
}

impl<'a> Exporter<'a> {
    #[must_use]
    pub fn new(store: &'a BugStore) -> Self {
        Self { store }
    }

    /// Where an export goes when no path is given: the store's configured
    /// report, else `BUGS.md` next to the store file.
    #[must_use]
    pub fn default_path(&self) -> PathBuf {
        self.store.report_path().map_or_else(
            || {
                self.store
                    .path()
                    .parent()
                    .unwrap_or_else(|| Path::new("."))
                    .join("BUGS.md")
            },
            Path::to_path_buf,
        )
    }

    /// Render the report without writing it.
    #[must_use]
    pub fn render(&self) -> String {
        render_report(self.store.list())
    }

    /// Write the report to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or `path` is the store file.
    pub fn export(&self, path: &Path) -> SyncResult<ExportStats> {
        if path == self.store.path() {
            return Err(SyncError::TargetIsStore(path.display().to_string()));
        }

        let report = self.render();
        let stats = self.stats(path, &report)?;

        if stats.unchanged {
            debug!(path = %path.display(), "Report already up to date");
        } else {
            atomic_write(path, &report)?;
            info!(path = %path.display(), bugs = stats.records, "Exported report");
        }
        Ok(stats)
    }

    /// What an export to `path` would report, without writing.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing report cannot be read.
    pub fn preview(&self, path: &Path) -> SyncResult<ExportStats> {
        self.stats(path, &self.render())
    }

    fn stats(&self, path: &Path, report: &str) -> SyncResult<ExportStats> {
        let existing = read_optional(path)?.map(|text| report_hash(&text));
        let unchanged = !has_changed(&report_hash(report), existing.as_deref());

        Ok(ExportStats {
            records: self.store.len(),
            counts: StatusCounts::tally(self.store.list()),
            path: path.to_path_buf(),
            unchanged,
        })
    }
}
