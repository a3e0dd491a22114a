//! Bug command implementations.

use colored::Colorize;
use serde::Serialize;

use crate::cli::{AddArgs, ListArgs, NoteArgs, SolveArgs};
use crate::cli::commands::open_store;
use crate::config::{Paths, absolute_path, parse_location};
use crate::error::{Error, Result};
use crate::model::{BugRecord, Location, Severity, Status, format_timestamp};
use crate::storage::{BugStore, NewBug};
use crate::validate::{not_found, parse_severity_arg, parse_status_arg};
use crate::view::{Decoration, TreeItem, build_items, decorations_for};

/// Output for bug list.
#[derive(Serialize)]
struct BugListOutput<'a> {
    count: usize,
    bugs: Vec<&'a BugRecord>,
    items: Vec<TreeItem>,
}

/// Output for remove.
#[derive(Serialize)]
struct RemoveOutput<'a> {
    removed: Vec<&'a str>,
    not_found: Vec<&'a str>,
}

/// Output for marks.
#[derive(Serialize)]
struct MarksOutput {
    file: String,
    count: usize,
    marks: Vec<Decoration>,
}

/// Execute `bt add`.
///
/// # Errors
///
/// Returns an error for a bad location or severity, or if the store could
/// not be saved.
pub fn add(args: &AddArgs, paths: &Paths, json: bool) -> Result<()> {
    let location = parse_location(&args.at)?;
    let severity = parse_severity_arg(&args.severity)?;
    create(
        Some(location),
        &args.description,
        severity,
        args.solution.as_deref(),
        paths,
        json,
    )
}

/// Execute `bt note`.
///
/// # Errors
///
/// Returns an error for a bad severity, or if the store could not be saved.
pub fn note(args: &NoteArgs, paths: &Paths, json: bool) -> Result<()> {
    let severity = parse_severity_arg(&args.severity)?;
    create(
        None,
        &args.description,
        severity,
        args.solution.as_deref(),
        paths,
        json,
    )
}

fn create(
    location: Option<Location>,
    description: &str,
    severity: Severity,
    solution: Option<&str>,
    paths: &Paths,
    json: bool,
) -> Result<()> {
    if description.trim().is_empty() {
        return Err(Error::RequiredField("description"));
    }

    // Dry-run: preview without writing
    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "add_bug",
                "description": description.trim(),
                "severity": severity,
                "location": location,
                "solution": solution,
            });
            println!("{output}");
        } else {
            match &location {
                Some(loc) => println!(
                    "Would record bug at {}:{}:{}: {} [{severity}]",
                    loc.file,
                    u64::from(loc.line) + 1,
                    u64::from(loc.column) + 1,
                    description.trim()
                ),
                None => println!("Would record standalone bug: {} [{severity}]", description.trim()),
            }
        }
        return Ok(());
    }

    let mut new = match location {
        Some(loc) => NewBug::at(loc, description, severity),
        None => NewBug::standalone(description, severity),
    };
    if let Some(solution) = solution {
        new = new.with_solution(solution);
    }

    let mut store = open_store(paths);
    let bug = store.add(new)?;

    if crate::is_silent() {
        println!("{}", bug.id);
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(&bug)?);
    } else {
        println!("Recorded bug: {} [{}]", bug.description, bug.id.cyan());
        if bug.is_standalone {
            println!("  Location: standalone");
        } else {
            println!(
                "  Location: {}:{}:{}",
                bug.file,
                u64::from(bug.line) + 1,
                u64::from(bug.column) + 1
            );
            if !bug.code.is_empty() {
                println!("  Code:     {}", bug.code.dimmed());
            }
        }
        println!("  Severity: {} {}", bug.severity.symbol(), bug.severity);
    }
    Ok(())
}

/// Execute `bt remove`.
///
/// Unknown ids are reported but are not an error.
///
/// # Errors
///
/// Returns an error if the store could not be saved.
pub fn remove(ids: &[String], paths: &Paths, json: bool) -> Result<()> {
    let mut store = open_store(paths);

    let (known, unknown): (Vec<&str>, Vec<&str>) = ids
        .iter()
        .map(String::as_str)
        .partition(|id| store.contains(id));

    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "remove_bugs",
                "would_remove": known,
                "not_found": unknown,
            });
            println!("{output}");
        } else {
            for id in &known {
                println!("Would remove bug: {id}");
            }
            for id in &unknown {
                println!("No bug {id} (nothing to remove)");
            }
        }
        return Ok(());
    }

    let mut removed = Vec::new();
    let mut not_found = unknown;
    for id in known {
        if store.remove(id)? {
            removed.push(id);
        } else {
            not_found.push(id);
        }
    }

    if crate::is_silent() {
        for id in &removed {
            println!("{id}");
        }
        return Ok(());
    }

    if json {
        let output = RemoveOutput { removed, not_found };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        for id in &removed {
            println!("Removed bug: {id}");
        }
        for id in &not_found {
            println!("{}", format!("No bug {id} (nothing to remove)").dimmed());
        }
    }
    Ok(())
}

/// Look up a bug for a command that must act on an existing one.
fn require<'a>(store: &'a BugStore, id: &str) -> Result<&'a BugRecord> {
    store.get(id).ok_or_else(|| not_found(id, &store.ids()))
}

/// Execute `bt set-status`.
///
/// # Errors
///
/// Returns `BugNotFound` for an unknown id, `InvalidStatus` for a bad
/// status, or an error if the store could not be saved.
pub fn set_status(id: &str, status: &str, paths: &Paths, json: bool) -> Result<()> {
    let status = parse_status_arg(status)?;
    let mut store = open_store(paths);
    let from = require(&store, id)?.status;

    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "set_status",
                "id": id,
                "from": from,
                "to": status,
            });
            println!("{output}");
        } else {
            println!("Would set {id}: {from} → {status}");
        }
        return Ok(());
    }

    store.update_status(id, status)?;
    let bug = require(&store, id)?;

    if crate::is_silent() {
        println!("{id}");
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(bug)?);
    } else {
        println!(
            "{}: {} → {} {}",
            id.cyan(),
            from,
            status.symbol(),
            status_colored(status)
        );
    }
    Ok(())
}

/// Execute `bt solve`.
///
/// # Errors
///
/// Returns `BugNotFound` for an unknown id, or an error if the store could
/// not be saved.
pub fn solve(args: &SolveArgs, paths: &Paths, json: bool) -> Result<()> {
    let text = if args.clear {
        ""
    } else {
        args.text.as_deref().unwrap_or_default()
    };

    let mut store = open_store(paths);
    require(&store, &args.id)?;

    if crate::is_dry_run() {
        if json {
            let output = serde_json::json!({
                "dry_run": true,
                "action": "set_solution",
                "id": args.id,
                "solution": (!text.trim().is_empty()).then(|| text.trim()),
            });
            println!("{output}");
        } else if text.trim().is_empty() {
            println!("Would clear the solution of {}", args.id);
        } else {
            println!("Would set the solution of {}: {}", args.id, text.trim());
        }
        return Ok(());
    }

    store.update_solution(&args.id, text)?;
    let bug = require(&store, &args.id)?;

    if crate::is_silent() {
        println!("{}", bug.id);
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(bug)?);
    } else {
        match &bug.solution {
            Some(solution) => println!("Solution recorded for {}: {solution}", bug.id.cyan()),
            None => println!("Solution cleared for {}", bug.id.cyan()),
        }
    }
    Ok(())
}

/// Execute `bt list`.
///
/// # Errors
///
/// Returns an error for a bad status or severity filter.
pub fn list(args: &ListArgs, paths: &Paths, json: bool) -> Result<()> {
    let status = args.status.as_deref().map(parse_status_arg).transpose()?;
    let severity = args.severity.as_deref().map(parse_severity_arg).transpose()?;

    let store = open_store(paths);
    let mut bugs = match &args.file {
        Some(file) => {
            let file = absolute_path(file).to_string_lossy().to_string();
            store.list_for_location(&file)
        }
        None => store.list_sorted(),
    };
    bugs.retain(|b| {
        status.is_none_or(|s| b.status == s)
            && severity.is_none_or(|s| b.severity == s)
            && (!args.standalone || b.is_standalone)
    });
    bugs.sort_by(|a, b| BugRecord::newest_first(a, b));

    if crate::is_csv() {
        println!("id,severity,status,file,line,column,description,solution");
        for bug in &bugs {
            let (line, column) = if bug.is_standalone {
                (String::new(), String::new())
            } else {
                (
                    (u64::from(bug.line) + 1).to_string(),
                    (u64::from(bug.column) + 1).to_string(),
                )
            };
            println!(
                "{},{},{},{},{},{},{},{}",
                bug.id,
                bug.severity,
                bug.status,
                crate::csv_escape(&bug.file),
                line,
                column,
                crate::csv_escape(&bug.description),
                crate::csv_escape(bug.solution.as_deref().unwrap_or("")),
            );
        }
    } else if json {
        let output = BugListOutput {
            count: bugs.len(),
            items: build_items(bugs.iter().copied()),
            bugs,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if bugs.is_empty() {
        println!("No bugs found.");
    } else {
        print_bug_list(&bugs);
    }
    Ok(())
}

/// Print formatted bug list to stdout.
fn print_bug_list(bugs: &[&BugRecord]) {
    println!("Bugs ({} found):", bugs.len());
    println!();
    for bug in bugs {
        let item = TreeItem::from_record(bug);
        println!(
            "{} [{}] {}",
            bug.severity.symbol(),
            item.id.cyan(),
            truncate(&item.label, 70)
        );
        println!("        {}", item.description.dimmed());
    }
}

fn truncate(text: &str, max: usize) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > max {
        let cut: String = first_line.chars().take(max).collect();
        format!("{cut}...")
    } else if first_line.len() < text.len() {
        format!("{first_line} ...")
    } else {
        first_line.to_string()
    }
}

fn status_colored(status: Status) -> colored::ColoredString {
    match status {
        Status::Open => status.as_str().red(),
        Status::InProgress => status.as_str().yellow(),
        Status::Resolved => status.as_str().green(),
        Status::Closed => status.as_str().dimmed(),
    }
}

/// Execute `bt show`.
///
/// # Errors
///
/// Returns `BugNotFound` for an unknown id.
pub fn show(id: &str, paths: &Paths, json: bool) -> Result<()> {
    let store = open_store(paths);
    let bug = require(&store, id)?;

    if json {
        println!("{}", serde_json::to_string(bug)?);
        return Ok(());
    }

    println!("{} {}", bug.id.cyan().bold(), bug.description.lines().next().unwrap_or_default());
    println!();
    for line in bug.description.lines().skip(1) {
        println!("  {line}");
    }
    println!("  Severity: {} {}", bug.severity.symbol(), bug.severity);
    println!("  Status:   {} {}", bug.status.symbol(), status_colored(bug.status));
    if bug.is_standalone {
        println!("  Location: standalone");
    } else {
        println!(
            "  Location: {}:{}:{}",
            bug.file,
            u64::from(bug.line) + 1,
            u64::from(bug.column) + 1
        );
        println!("  Code:     {}", bug.code.dimmed());
    }
    println!("  Created:  {}", format_timestamp(&bug.created_at));
    println!("  Updated:  {}", format_timestamp(&bug.updated_at));
    match &bug.solution {
        Some(solution) => {
            println!("  Solution:");
            for line in solution.lines() {
                println!("    {line}");
            }
        }
        None => println!("  Solution: {}", "pending".dimmed()),
    }
    Ok(())
}

/// Execute `bt marks`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn marks(file: &std::path::Path, paths: &Paths, json: bool) -> Result<()> {
    let file = absolute_path(file).to_string_lossy().to_string();
    let store = open_store(paths);
    let marks = decorations_for(&store, &file);

    if crate::is_csv() {
        println!("id,line,start_column,end_column");
        for mark in &marks {
            println!(
                "{},{},{},{}",
                mark.id,
                u64::from(mark.line) + 1,
                u64::from(mark.start_column) + 1,
                u64::from(mark.end_column) + 1
            );
        }
    } else if json {
        let output = MarksOutput {
            file,
            count: marks.len(),
            marks,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if marks.is_empty() {
        println!("No bugs in {file}.");
    } else {
        println!("{file}:");
        for mark in &marks {
            let mut hover = mark.hover.lines();
            println!(
                "  {:>5}:{:<3} {}",
                u64::from(mark.line) + 1,
                u64::from(mark.start_column) + 1,
                hover.next().unwrap_or_default()
            );
            for line in hover {
                println!("            {}", line.dimmed());
            }
        }
    }
    Ok(())
}
