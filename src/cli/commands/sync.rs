//! Report command implementations (export, import, summary).

use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::cli::commands::open_store;
use crate::config::{Paths, absolute_path};
use crate::error::{Error, Result};
use crate::sync::{ExportStats, Exporter, ImportStats, Importer, get_report_status, print_status};

/// Execute `bt export`.
///
/// # Errors
///
/// Returns an error if the report cannot be written.
pub fn export(output: Option<&Path>, paths: &Paths, json: bool) -> Result<()> {
    let store = open_store(paths);
    let exporter = Exporter::new(&store);
    let path = output.map_or_else(|| exporter.default_path(), absolute_path);

    if crate::is_dry_run() {
        let stats = exporter.preview(&path)?;
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "export",
                "stats": stats,
            });
            println!("{output}");
        } else {
            println!(
                "Would write {} bugs to {}{}",
                stats.records,
                path.display(),
                if stats.unchanged { " (unchanged)" } else { "" }
            );
        }
        return Ok(());
    }

    let stats = exporter.export(&path)?;

    if crate::is_silent() {
        println!("{}", stats.path.display());
        return Ok(());
    }

    if json {
        let output = serde_json::json!({
            "success": true,
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_export(&stats);
    }
    Ok(())
}

fn print_export(stats: &ExportStats) {
    if stats.unchanged {
        println!("Report already up to date: {}", stats.path.display());
        return;
    }
    println!("Export complete: {}", stats.path.display());
    println!();
    println!("  Open:        {}", stats.counts.open);
    println!("  In progress: {}", stats.counts.in_progress);
    println!("  Resolved:    {}", stats.counts.resolved);
    println!("  Closed:      {}", stats.counts.closed);
    println!();
    println!("  Total: {} bugs", stats.records);
}

/// Execute `bt import`.
///
/// # Errors
///
/// Returns `Config` when there is no report to read, or an error if the
/// merged store cannot be saved.
pub fn import(input: Option<&Path>, paths: &Paths, json: bool) -> Result<()> {
    let path: PathBuf = match input {
        Some(path) => absolute_path(path),
        None => paths.report.clone().ok_or_else(|| {
            Error::Config("No report configured; pass --input <file>".to_string())
        })?,
    };

    let mut store = open_store(paths);

    if crate::is_dry_run() {
        let stats = Importer::new(&mut store).preview(&path)?;
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "import",
                "path": path,
                "stats": stats,
            });
            println!("{output}");
        } else {
            println!(
                "Would import {} new bugs from {} ({} already present, {} invalid)",
                stats.created.len(),
                path.display(),
                stats.skipped.len(),
                stats.rejected.len()
            );
        }
        return Ok(());
    }

    let stats = Importer::new(&mut store).import(&path)?;

    if crate::is_silent() {
        for id in &stats.created {
            println!("{id}");
        }
        return Ok(());
    }

    if json {
        let output = serde_json::json!({
            "success": true,
            "path": path,
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_import(&path, &stats);
    }
    Ok(())
}

fn print_import(path: &Path, stats: &ImportStats) {
    if stats.total_processed() == 0 {
        println!("No bugs found in {}.", path.display());
        return;
    }

    println!("Import complete: {}", path.display());
    println!();
    println!("  Created: {}", stats.created.len());
    println!("  Skipped: {} (already in store)", stats.skipped.len());
    if !stats.rejected.is_empty() {
        println!(
            "  {}",
            format!("Rejected: {}", stats.rejected.len()).yellow()
        );
        for rejected in &stats.rejected {
            println!(
                "    {} (line {}): {}",
                rejected.id, rejected.line, rejected.reason
            );
        }
    }
    if let Some(backup) = &stats.backup {
        println!("  Original report kept at {}", backup.display());
    }
}

/// Execute `bt summary`.
///
/// # Errors
///
/// Returns an error if the report exists but cannot be read.
pub fn summary(paths: &Paths, json: bool) -> Result<()> {
    let store = open_store(paths);
    let status = get_report_status(&store)?;

    if json {
        println!("{}", serde_json::to_string(&status)?);
    } else {
        print_status(&status);
    }
    Ok(())
}
