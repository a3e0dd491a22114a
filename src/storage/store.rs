//! The bug store.
//!
//! Owns every [`BugRecord`]. Each applied mutation rewrites the whole JSON
//! store file, regenerates the markdown report when one is configured, and
//! then notifies listeners. A failed write is returned to the caller but
//! the in-memory change stands; the next successful write catches the disk
//! up.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{BugRecord, Location, Severity, Status, new_bug_id};
use crate::storage::events::{Listener, ListenerId, Listeners, StoreEvent};
use crate::storage::json::{LoadReport, encode_records, load_records};
use crate::storage::source::{FsLineSource, LineSource};
use crate::sync::{atomic_write, render_report};

/// Input for [`BugStore::add`].
#[derive(Debug, Clone)]
pub struct NewBug {
    /// `None` for a standalone bug.
    pub location: Option<Location>,
    pub description: String,
    pub severity: Severity,
    pub solution: Option<String>,
}

impl NewBug {
    /// A bug pinned to a source location.
    pub fn at(location: Location, description: &str, severity: Severity) -> Self {
        Self {
            location: Some(location),
            description: description.to_string(),
            severity,
            solution: None,
        }
    }

    /// A bug with no source location.
    pub fn standalone(description: &str, severity: Severity) -> Self {
        Self {
            location: None,
            description: description.to_string(),
            severity,
            solution: None,
        }
    }

    /// Attach resolution notes up front.
    #[must_use]
    pub fn with_solution(mut self, solution: &str) -> Self {
        self.solution = Some(solution.to_string());
        self
    }
}

/// Result of an additive merge.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// IDs appended to the store.
    pub added: Vec<String>,
    /// IDs already present, left untouched.
    pub skipped: Vec<String>,
}

/// In-memory bug list backed by a JSON file.
pub struct BugStore {
    path: PathBuf,
    report_path: Option<PathBuf>,
    records: Vec<BugRecord>,
    load_report: LoadReport,
    line_source: Box<dyn LineSource>,
    listeners: Listeners,
}

impl BugStore {
    /// Open the store at `path`.
    ///
    /// Never fails: a missing or corrupt file gives an empty store, and
    /// invalid entries are dropped (see [`BugStore::load_report`]).
    pub fn open(path: &Path) -> Self {
        let (records, load_report) = load_records(path);
        debug!(
            path = %path.display(),
            loaded = load_report.loaded,
            rejected = load_report.rejected.len(),
            "Opened bug store"
        );

        Self {
            path: path.to_path_buf(),
            report_path: None,
            records,
            load_report,
            line_source: Box::new(FsLineSource),
            listeners: Listeners::default(),
        }
    }

    /// Regenerate the markdown report at `path` on every write.
    #[must_use]
    pub fn with_report(mut self, path: Option<PathBuf>) -> Self {
        self.report_path = path;
        self
    }

    /// Use `source` for code snapshots instead of reading from disk.
    #[must_use]
    pub fn with_line_source(mut self, source: impl LineSource + 'static) -> Self {
        self.line_source = Box::new(source);
        self
    }

    // ── Queries ──────────────────────────────────────────────

    /// Path of the JSON store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the markdown report, if one is configured.
    #[must_use]
    pub fn report_path(&self) -> Option<&Path> {
        self.report_path.as_deref()
    }

    /// What happened when the store file was loaded.
    #[must_use]
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    /// All records, in insertion order.
    #[must_use]
    pub fn list(&self) -> &[BugRecord] {
        &self.records
    }

    /// All records, newest first.
    #[must_use]
    pub fn list_sorted(&self) -> Vec<&BugRecord> {
        let mut sorted: Vec<&BugRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| BugRecord::newest_first(a, b));
        sorted
    }

    /// Records whose `file` is exactly `file`.
    #[must_use]
    pub fn list_for_location(&self, file: &str) -> Vec<&BugRecord> {
        self.records.iter().filter(|r| r.file == file).collect()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BugRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Every id in the store (for "did you mean" suggestions).
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ── Listeners ────────────────────────────────────────────

    /// Register a callback run after every applied mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent, &[BugRecord]) + 'static) -> ListenerId {
        let listener: Listener = Box::new(listener);
        self.listeners.subscribe(listener)
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // ── Mutations ────────────────────────────────────────────

    /// Record a new bug.
    ///
    /// Located bugs get a trimmed snapshot of their source line; if the
    /// line cannot be read the snapshot is empty.
    ///
    /// # Errors
    ///
    /// Returns `RequiredField` for an empty description, `InvalidLocation`
    /// for a location with an empty file, and `Persist` if the write
    /// failed (the bug is still in the store).
    pub fn add(&mut self, new: NewBug) -> Result<BugRecord> {
        let description = new.description.trim();
        if description.is_empty() {
            return Err(Error::RequiredField("description"));
        }
        if let Some(loc) = &new.location {
            if loc.file.trim().is_empty() {
                return Err(Error::InvalidLocation(format!(":{}:{}", loc.line + 1, loc.column + 1)));
            }
        }

        let mut record = BugRecord::new(new.location, description, new.severity);
        while self.contains(&record.id) {
            record.id = new_bug_id();
        }
        if let Some(loc) = record.location() {
            record.code = self.snapshot(&loc);
        }
        record.solution = new
            .solution
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        info!(id = %record.id, standalone = record.is_standalone, severity = %record.severity, "Bug added");
        self.records.push(record.clone());
        self.commit(&StoreEvent::Added {
            id: record.id.clone(),
        })?;

        Ok(record)
    }

    /// Delete a bug. Unknown ids are a no-op returning `false`.
    ///
    /// # Errors
    ///
    /// Returns `Persist` if the write failed (the bug stays deleted in memory).
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.records.iter().position(|r| r.id == id) else {
            debug!(id, "Remove: no such bug");
            return Ok(false);
        };

        self.records.remove(index);
        info!(id, "Bug removed");
        self.commit(&StoreEvent::Removed { id: id.to_string() })?;
        Ok(true)
    }

    /// Set a bug's status. Unknown ids are a no-op returning `false`.
    ///
    /// # Errors
    ///
    /// Returns `Persist` if the write failed.
    pub fn update_status(&mut self, id: &str, status: Status) -> Result<bool> {
        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            debug!(id, "Update status: no such bug");
            return Ok(false);
        };

        let from = record.status;
        record.status = status;
        record.touch();
        info!(id, from = %from, to = %status, "Bug status updated");

        self.commit(&StoreEvent::StatusChanged {
            id: id.to_string(),
            from,
            to: status,
        })?;
        Ok(true)
    }

    /// Set or clear (empty text) a bug's solution. Unknown ids are a no-op
    /// returning `false`.
    ///
    /// # Errors
    ///
    /// Returns `Persist` if the write failed.
    pub fn update_solution(&mut self, id: &str, text: &str) -> Result<bool> {
        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            debug!(id, "Update solution: no such bug");
            return Ok(false);
        };

        let text = text.trim();
        record.solution = (!text.is_empty()).then(|| text.to_string());
        record.touch();
        info!(id, cleared = text.is_empty(), "Bug solution updated");

        self.commit(&StoreEvent::SolutionChanged { id: id.to_string() })?;
        Ok(true)
    }

    /// Append records whose ids are not already present.
    ///
    /// Existing records are never overwritten or deleted. Writes once, and
    /// only if something was added.
    ///
    /// # Errors
    ///
    /// Returns `Persist` if the write failed (the merged records stay in memory).
    pub fn merge(&mut self, incoming: Vec<BugRecord>) -> Result<MergeOutcome> {
        let mut known: HashSet<String> = self.records.iter().map(|r| r.id.clone()).collect();
        let mut outcome = MergeOutcome::default();

        for record in incoming {
            if known.contains(&record.id) {
                outcome.skipped.push(record.id);
                continue;
            }
            known.insert(record.id.clone());
            outcome.added.push(record.id.clone());
            self.records.push(record);
        }

        info!(
            added = outcome.added.len(),
            skipped = outcome.skipped.len(),
            "Merged bugs"
        );

        if !outcome.added.is_empty() {
            self.commit(&StoreEvent::Merged {
                ids: outcome.added.clone(),
            })?;
        }
        Ok(outcome)
    }

    /// Write the store file and the report.
    ///
    /// # Errors
    ///
    /// Returns `Persist` naming the file that could not be written.
    pub fn save(&self) -> Result<()> {
        let json = encode_records(&self.records)?;
        atomic_write(&self.path, &json).map_err(|source| Error::Persist {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), bugs = self.records.len(), "Saved bug store");

        if let Some(report_path) = &self.report_path {
            let markdown = render_report(&self.records);
            atomic_write(report_path, &markdown).map_err(|source| Error::Persist {
                path: report_path.clone(),
                source,
            })?;
            debug!(path = %report_path.display(), "Regenerated report");
        }

        Ok(())
    }

    /// Persist, then notify listeners whether or not the write worked.
    fn commit(&mut self, event: &StoreEvent) -> Result<()> {
        let saved = self.save();
        if let Err(e) = &saved {
            warn!(event = event.kind(), error = %e, "Change kept in memory but not saved");
        }
        self.listeners.notify(event, &self.records);
        saved
    }

    fn snapshot(&self, loc: &Location) -> String {
        match self.line_source.read_line(Path::new(&loc.file), loc.line) {
            Some(text) => text.trim().to_string(),
            None => {
                debug!(file = %loc.file, line = loc.line, "No code snapshot available");
                String::new()
            }
        }
    }
}

impl std::fmt::Debug for BugStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BugStore")
            .field("path", &self.path)
            .field("report_path", &self.report_path)
            .field("records", &self.records.len())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
