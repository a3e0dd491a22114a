//! Report status display.
//!
//! Compares the store with the report on disk: how many bugs there are,
//! whether the report exists, and whether it still matches the store.

use colored::Colorize;

use crate::model::StatusCounts;
use crate::storage::BugStore;
use crate::sync::file::{file_size, read_optional};
use crate::sync::hash::report_hash;
use crate::sync::render::render_report;
use crate::sync::types::{ReportStatus, SyncResult};

/// Get the current report status for a store.
///
/// # Errors
///
/// Returns an error if an existing report cannot be read.
pub fn get_report_status(store: &BugStore) -> SyncResult<ReportStatus> {
    let records = store.list();
    let report_path = store.report_path().map(ToOwned::to_owned);

    let existing = match &report_path {
        Some(path) => read_optional(path)?,
        None => None,
    };
    let report_exists = existing.is_some();
    let report_stale = existing
        .is_some_and(|text| report_hash(&text) != report_hash(&render_report(records)));

    Ok(ReportStatus {
        store_path: store.path().to_path_buf(),
        total: records.len(),
        counts: StatusCounts::tally(records),
        standalone: records.iter().filter(|r| r.is_standalone).count(),
        report_size: report_path.as_deref().map_or(0, file_size),
        report_path,
        report_exists,
        report_stale,
        rejected_on_load: store.load_report().rejected.len(),
    })
}

/// Print report status to stdout in a human-readable format.
pub fn print_status(status: &ReportStatus) {
    println!("{}", "Bug Summary".bold().underline());
    println!();

    if status.total == 0 {
        println!("{}", "No bugs recorded.".dimmed());
    } else {
        println!("  {}     {}", "Open:".red(), status.counts.open);
        println!("  {} {}", "In progress:".yellow(), status.counts.in_progress);
        println!("  {} {}", "Resolved:".green(), status.counts.resolved);
        println!("  {}   {}", "Closed:".dimmed(), status.counts.closed);
        println!("  {}    {}", "Total:".bold(), status.total);
        if status.standalone > 0 {
            println!("  ({} standalone)", status.standalone);
        }
    }
    println!();

    println!("{} {}", "Store:".blue().bold(), status.store_path.display());
    if status.rejected_on_load > 0 {
        println!(
            "  {}",
            format!("{} invalid entries skipped on load", status.rejected_on_load).yellow()
        );
    }

    match &status.report_path {
        None => println!("{} {}", "Report:".blue().bold(), "not configured".dimmed()),
        Some(path) if !status.report_exists => {
            println!("{} {}", "Report:".blue().bold(), path.display());
            println!("  {}", "Not written yet. Run 'bt export' to create it.".dimmed());
        }
        Some(path) => {
            println!(
                "{} {} ({})",
                "Report:".blue().bold(),
                path.display(),
                format_size(status.report_size)
            );
            if status.report_stale {
                println!("  {}", "Out of date. Run 'bt export' to refresh it.".yellow());
            } else {
                println!("  {}", "Up to date.".green());
            }
        }
    }
}

/// Format a byte size as a human-readable string.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Severity, Status};
    use crate::storage::NewBug;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_status_tracks_report() {
        let dir = TempDir::new().unwrap();
        let report = dir.path().join("BUGS.md");
        let mut store =
            BugStore::open(&dir.path().join("bugs.json")).with_report(Some(report.clone()));

        let status = get_report_status(&store).unwrap();
        assert_eq!(status.total, 0);
        assert!(!status.report_exists);
        assert!(!status.report_stale);

        let bug = store
            .add(NewBug::standalone("crash on resize", Severity::High))
            .unwrap();
        store.update_status(&bug.id, Status::InProgress).unwrap();

        let status = get_report_status(&store).unwrap();
        assert_eq!(status.total, 1);
        assert_eq!(status.counts.in_progress, 1);
        assert_eq!(status.standalone, 1);
        assert!(status.report_exists);
        assert!(!status.report_stale);
        assert!(status.report_size > 0);

        fs::write(&report, "# Bug Report\n").unwrap();
        assert!(get_report_status(&store).unwrap().report_stale);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(1024 * 1024 * 3), "3.0 MB");
    }
}
