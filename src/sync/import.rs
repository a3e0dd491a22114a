//! Report import.
//!
//! Import is additive: sections whose id is already in the store are
//! skipped, new ones are appended, nothing is overwritten or deleted.
//! Running the same import twice changes nothing the second time.
//!
//! Importing the store's own report is allowed. The store regenerates that
//! file on save, so when it holds sections that did not decode, the text as
//! read is first copied to `<report>.bak`.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::storage::BugStore;
use crate::sync::file::{atomic_write, backup_path_for, read_optional, same_file};
use crate::sync::parse::{ParsedReport, parse_report};
use crate::sync::types::{ImportStats, SyncError};

/// Importer for markdown reports.
pub struct Importer<'a> {
    store: &'a mut BugStore,
}

impl<'a> Importer<'a> {
    #[must_use]
    pub fn new(store: &'a mut BugStore) -> Self {
        Self { store }
    }

    /// Import a report file.
    ///
    /// A missing file imports nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, if the backup
    /// of a partly rejected report cannot be written, or if the store could
    /// not be saved after merging.
    pub fn import(&mut self, path: &Path) -> Result<ImportStats> {
        let Some(text) = read_optional(path).map_err(SyncError::from)? else {
            debug!(path = %path.display(), "No report to import");
            return Ok(ImportStats::default());
        };

        let parsed = parse_report(&text);
        let backup = if !parsed.rejected.is_empty() && self.is_own_report(path) {
            let backup = backup_path_for(path);
            atomic_write(&backup, &text).map_err(SyncError::from)?;
            warn!(
                path = %path.display(),
                backup = %backup.display(),
                rejected = parsed.rejected.len(),
                "Report has sections that did not decode, kept a copy"
            );
            Some(backup)
        } else {
            None
        };

        let mut stats = self.merge(parsed)?;
        stats.backup = backup;
        info!(
            path = %path.display(),
            created = stats.created.len(),
            skipped = stats.skipped.len(),
            rejected = stats.rejected.len(),
            "Imported report"
        );
        Ok(stats)
    }

    /// Import report text.
    ///
    /// # Errors
    ///
    /// Returns `Persist` if the merged store could not be saved. The merged
    /// bugs stay in memory either way.
    pub fn import_str(&mut self, text: &str) -> Result<ImportStats> {
        self.merge(parse_report(text))
    }

    fn merge(&mut self, parsed: ParsedReport) -> Result<ImportStats> {
        let outcome = self.store.merge(parsed.records)?;

        Ok(ImportStats {
            created: outcome.added,
            skipped: outcome.skipped,
            rejected: parsed.rejected,
            backup: None,
        })
    }

    /// The store rewrites this file on save.
    fn is_own_report(&self, path: &Path) -> bool {
        self.store
            .report_path()
            .is_some_and(|report| same_file(report, path))
    }

    /// Decode a report without touching the store.
    ///
    /// Fills in what an import would do, for `--dry-run`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn preview(&self, path: &Path) -> Result<ImportStats> {
        let Some(text) = read_optional(path).map_err(SyncError::from)? else {
            return Ok(ImportStats::default());
        };

        let parsed = parse_report(&text);
        let mut stats = ImportStats {
            rejected: parsed.rejected,
            ..ImportStats::default()
        };
        for record in parsed.records {
            if self.store.contains(&record.id) {
                stats.skipped.push(record.id);
            } else {
                stats.created.push(record.id);
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, Severity, Status};
    use crate::storage::NewBug;
    use crate::sync::render::render_report;
    use std::fs;
    use tempfile::TempDir;

    fn seeded(dir: &TempDir) -> BugStore {
        let mut store = BugStore::open(&dir.path().join("bugs.json"))
            .with_line_source(|_: &Path, _: u32| Some("    let x = 1;".to_string()));
        store
            .add(NewBug::at(
                Location::new("/w/a.rs", 4, 0),
                "panics on empty input",
                Severity::High,
            ))
            .unwrap();
        let note = store
            .add(NewBug::standalone("docs are stale", Severity::Low))
            .unwrap();
        store.update_status(&note.id, Status::Closed).unwrap();
        store
            .update_solution(&note.id, "rewrote the README")
            .unwrap();
        store
    }

    #[test]
    fn test_round_trip_into_empty_store() {
        let dir = TempDir::new().unwrap();
        let source = seeded(&dir);
        let report = render_report(source.list());

        let mut target = BugStore::open(&dir.path().join("other.json"));
        let stats = Importer::new(&mut target).import_str(&report).unwrap();

        assert_eq!(stats.created.len(), 2);
        assert!(stats.skipped.is_empty());
        assert!(stats.rejected.is_empty());
        for original in source.list() {
            assert_eq!(target.get(&original.id), Some(original));
        }
    }

    #[test]
    fn test_import_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let source = seeded(&dir);
        let path = dir.path().join("BUGS.md");
        fs::write(&path, render_report(source.list())).unwrap();

        let mut target = BugStore::open(&dir.path().join("other.json"));
        let first = Importer::new(&mut target).import(&path).unwrap();
        let after_first = target.list().to_vec();
        let second = Importer::new(&mut target).import(&path).unwrap();

        assert_eq!(first.created.len(), 2);
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), 2);
        assert_eq!(target.list(), after_first.as_slice());
    }

    #[test]
    fn test_import_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let mut store = seeded(&dir);
        let report = render_report(store.list());

        let id = store.list()[0].id.clone();
        store.update_status(&id, Status::InProgress).unwrap();
        let stats = Importer::new(&mut store).import_str(&report).unwrap();

        assert!(stats.created.is_empty());
        assert_eq!(store.get(&id).unwrap().status, Status::InProgress);
    }

    #[test]
    fn test_missing_report_imports_nothing() {
        let dir = TempDir::new().unwrap();
        let mut store = BugStore::open(&dir.path().join("bugs.json"));
        let stats = Importer::new(&mut store)
            .import(&dir.path().join("missing.md"))
            .unwrap();
        assert_eq!(stats.total_processed(), 0);
        assert!(!dir.path().join("bugs.json").exists());
    }

    #[test]
    fn test_quoted_whitespace_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut source = BugStore::open(&dir.path().join("bugs.json"));
        let bug = source
            .add(NewBug::standalone("first line  \n   \nthird", Severity::Low))
            .unwrap();
        source.update_solution(&bug.id, "a  \n   \nb").unwrap();

        let mut target = BugStore::open(&dir.path().join("other.json"));
        Importer::new(&mut target)
            .import_str(&render_report(source.list()))
            .unwrap();

        let decoded = target.get(&bug.id).unwrap();
        assert_eq!(decoded.description, "first line  \n   \nthird");
        assert_eq!(decoded.solution.as_deref(), Some("a  \n   \nb"));
        assert_eq!(target.list(), source.list());
    }

    #[test]
    fn test_own_report_with_rejections_is_backed_up() {
        let dir = TempDir::new().unwrap();
        let report = dir.path().join("BUGS.md");
        let mut store =
            BugStore::open(&dir.path().join("bugs.json")).with_report(Some(report.clone()));
        store
            .add(NewBug::standalone("already tracked", Severity::Medium))
            .unwrap();

        let mut text = fs::read_to_string(&report).unwrap();
        text.push_str(
            "### bug_hand1\n**Description:** fine\n**Severity:** low\n**Status:** open\n---\n\n\
             ### bug_hand2\n**Description:** typo\n**Severity:** hgih\n**Status:** open\n---\n",
        );
        fs::write(&report, &text).unwrap();

        let stats = Importer::new(&mut store).import(&report).unwrap();

        assert_eq!(stats.created, vec!["bug_hand1".to_string()]);
        assert_eq!(stats.rejected.len(), 1);
        assert_eq!(stats.rejected[0].id, "bug_hand2");

        let backup = dir.path().join("BUGS.md.bak");
        assert_eq!(stats.backup.as_deref(), Some(backup.as_path()));
        assert_eq!(fs::read_to_string(&backup).unwrap(), text);

        // The regenerated report only holds what the store has.
        let regenerated = fs::read_to_string(&report).unwrap();
        assert!(regenerated.contains("### bug_hand1"));
        assert!(!regenerated.contains("bug_hand2"));
    }

    #[test]
    fn test_foreign_report_is_not_backed_up() {
        let dir = TempDir::new().unwrap();
        let other = dir.path().join("theirs.md");
        fs::write(
            &other,
            "### bug_bad\n**Description:** x\n**Severity:** nope\n**Status:** open\n",
        )
        .unwrap();

        let mut store = BugStore::open(&dir.path().join("bugs.json"))
            .with_report(Some(dir.path().join("BUGS.md")));
        let stats = Importer::new(&mut store).import(&other).unwrap();

        assert_eq!(stats.rejected.len(), 1);
        assert!(stats.backup.is_none());
        assert!(!dir.path().join("theirs.md.bak").exists());
    }

    #[test]
    fn test_preview_leaves_store_alone() {
        let dir = TempDir::new().unwrap();
        let source = seeded(&dir);
        let path = dir.path().join("BUGS.md");
        fs::write(&path, render_report(source.list())).unwrap();

        let mut target = BugStore::open(&dir.path().join("other.json"));
        let stats = Importer::new(&mut target).preview(&path).unwrap();
        assert_eq!(stats.created.len(), 2);
        assert!(target.is_empty());
    }
}
