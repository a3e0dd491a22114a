//! Markdown report rendering.
//!
//! The report is the human-readable face of the store and doubles as an
//! import source, so its layout is fixed:
//!
//! ```text
//! # Bug Report
//! _Generated: <timestamp>_
//! ## Summary            per-status table plus total
//! ## Bugs
//! ### <id>              one section per bug, newest first
//! **Label:** value      labeled fields in fixed order
//! ---
//! ```
//!
//! Free text (description, solution) is written as a blockquote so it can
//! never be mistaken for a field, heading or separator. Code snippets sit
//! in a fence longer than any backtick run they contain.

use chrono::{DateTime, Utc};

use crate::model::{BugRecord, Status, StatusCounts, format_timestamp, now_millis};

pub const REPORT_TITLE: &str = "# Bug Report";
pub const SUMMARY_HEADING: &str = "## Summary";
pub const BUGS_HEADING: &str = "## Bugs";
pub const GENERATED_PREFIX: &str = "_Generated: ";
pub const SEPARATOR: &str = "---";

/// Written in place of a location for standalone bugs.
pub const STANDALONE_MARKER: &str = "_Standalone_";
/// Written, unquoted, when a bug has no solution.
pub const NO_SOLUTION: &str = "_Pending_";
pub const NO_BUGS: &str = "_No bugs recorded._";

pub const LABEL_DESCRIPTION: &str = "Description";
pub const LABEL_SEVERITY: &str = "Severity";
pub const LABEL_STATUS: &str = "Status";
pub const LABEL_FILE: &str = "File";
pub const LABEL_LINE: &str = "Line";
pub const LABEL_COLUMN: &str = "Column";
pub const LABEL_CODE: &str = "Code";
pub const LABEL_LOCATION: &str = "Location";
pub const LABEL_CREATED: &str = "Created";
pub const LABEL_UPDATED: &str = "Updated";
pub const LABEL_SOLUTION: &str = "Solution";

/// Render the full report, stamped with the current time.
#[must_use]
pub fn render_report(records: &[BugRecord]) -> String {
    render_report_at(records, now_millis())
}

/// Render the full report with an explicit generation time.
#[must_use]
pub fn render_report_at(records: &[BugRecord], generated: DateTime<Utc>) -> String {
    let counts = StatusCounts::tally(records);

    let mut out = String::new();
    out.push_str(REPORT_TITLE);
    out.push_str("\n\n");
    out.push_str(&format!("{GENERATED_PREFIX}{}_\n\n", format_timestamp(&generated)));
    render_summary(&mut out, &counts);
    out.push_str(&render_bugs(records));
    out
}

/// Render the `## Bugs` section on its own.
#[must_use]
pub fn render_bugs(records: &[BugRecord]) -> String {
    let mut sorted: Vec<&BugRecord> = records.iter().collect();
    sorted.sort_by(|a, b| BugRecord::newest_first(a, b));

    let mut out = String::new();
    out.push_str(BUGS_HEADING);
    out.push_str("\n\n");

    if sorted.is_empty() {
        out.push_str(NO_BUGS);
        out.push('\n');
        return out;
    }

    for record in sorted {
        render_record(&mut out, record);
    }
    out
}

fn render_summary(out: &mut String, counts: &StatusCounts) {
    out.push_str(SUMMARY_HEADING);
    out.push_str("\n\n");
    out.push_str("| Status | Count |\n");
    out.push_str("|--------|-------|\n");
    for status in Status::ALL {
        out.push_str(&format!(
            "| {} {} | {} |\n",
            status.symbol(),
            status.label(),
            counts.get(status)
        ));
    }
    out.push_str(&format!("| **Total** | **{}** |\n\n", counts.total()));
}

fn render_record(out: &mut String, record: &BugRecord) {
    out.push_str(&format!("### {}\n\n", record.id));

    push_label(out, LABEL_DESCRIPTION);
    out.push('\n');
    push_quote(out, &record.description);

    push_field(
        out,
        LABEL_SEVERITY,
        &format!("{} {}", record.severity.symbol(), record.severity),
    );
    push_field(
        out,
        LABEL_STATUS,
        &format!("{} {}", record.status.symbol(), record.status),
    );

    if record.is_standalone {
        push_field(out, LABEL_LOCATION, STANDALONE_MARKER);
    } else {
        push_field(out, LABEL_FILE, &record.file);
        push_field(out, LABEL_LINE, &(u64::from(record.line) + 1).to_string());
        push_field(out, LABEL_COLUMN, &(u64::from(record.column) + 1).to_string());
        push_label(out, LABEL_CODE);
        out.push('\n');
        push_code(out, &record.code);
    }

    push_field(out, LABEL_CREATED, &format_timestamp(&record.created_at));
    push_field(out, LABEL_UPDATED, &format_timestamp(&record.updated_at));

    match &record.solution {
        Some(solution) => {
            push_label(out, LABEL_SOLUTION);
            out.push('\n');
            push_quote(out, solution);
        }
        None => push_field(out, LABEL_SOLUTION, NO_SOLUTION),
    }

    out.push_str(SEPARATOR);
    out.push_str("\n\n");
}

fn push_label(out: &mut String, label: &str) {
    out.push_str(&format!("**{label}:**\n"));
}

fn push_field(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("**{label}:** {value}\n\n"));
}

/// Quote `text` line by line. Each line is kept byte for byte behind `> `.
fn push_quote(out: &mut String, text: &str) {
    for line in text.split('\n') {
        if line.is_empty() {
            out.push_str(">\n");
        } else {
            out.push_str(&format!("> {line}\n"));
        }
    }
    out.push('\n');
}

fn push_code(out: &mut String, code: &str) {
    let fence = code_fence(code);
    out.push_str(&fence);
    out.push('\n');
    if !code.is_empty() {
        out.push_str(code);
        out.push('\n');
    }
    out.push_str(&fence);
    out.push_str("\n\n");
}

/// A backtick fence longer than any backtick run in `code` (minimum three).
#[must_use]
pub fn code_fence(code: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in code.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}
