//! Markdown report parsing.
//!
//! The parser is line oriented. A document is split into sections at
//! `### <id>` headings (ignoring anything inside code fences), each section
//! is split into labeled fields, and each field goes through its own small
//! extractor. A section that lacks a description, severity or status is
//! rejected on its own; the rest of the document still decodes.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, warn};

use crate::model::{BugRecord, Severity, Status, now_millis, parse_timestamp};
use crate::sync::render::{
    LABEL_CODE, LABEL_COLUMN, LABEL_CREATED, LABEL_DESCRIPTION, LABEL_FILE, LABEL_LINE,
    LABEL_SEVERITY, LABEL_SOLUTION, LABEL_STATUS, LABEL_UPDATED, NO_SOLUTION, SEPARATOR,
};
use crate::sync::types::Rejected;
use crate::validate::{normalize_severity, normalize_status};

static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^###\s+(.*?)\s*$").expect("valid regex"));

static TOP_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,2}\s").expect("valid regex"));

/// `**Label:** value` or `**Label**: value`.
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*\s*([A-Za-z][A-Za-z ]*?)\s*(?::\*\*|\*\*\s*:)\s*(.*?)\s*$")
        .expect("valid regex")
});

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(`{3,})").expect("valid regex"));

/// Result of parsing a report.
#[derive(Debug, Default, Clone)]
pub struct ParsedReport {
    /// Decoded bugs in document order.
    pub records: Vec<BugRecord>,
    pub rejected: Vec<Rejected>,
}

/// One `### <id>` section.
#[derive(Debug)]
struct Section<'a> {
    id: String,
    line: usize,
    body: Vec<&'a str>,
}

/// One labeled field inside a section.
#[derive(Debug, Default)]
pub struct Field<'a> {
    /// Text after the label on the same line.
    pub inline: &'a str,
    /// Lines after the label line, up to the next label or separator.
    pub block: Vec<&'a str>,
}

/// Parse a report into bugs.
#[must_use]
pub fn parse_report(text: &str) -> ParsedReport {
    let mut parsed = ParsedReport::default();
    let mut seen = HashSet::new();

    for section in split_sections(text) {
        let result = decode_section(&section).and_then(|record| {
            if seen.insert(record.id.clone()) {
                Ok(record)
            } else {
                Err("duplicate id".to_string())
            }
        });

        match result {
            Ok(record) => parsed.records.push(record),
            Err(reason) => {
                warn!(id = %section.id, line = section.line, %reason, "Rejected report section");
                parsed.rejected.push(Rejected {
                    id: section.id,
                    line: section.line,
                    reason,
                });
            }
        }
    }

    debug!(
        records = parsed.records.len(),
        rejected = parsed.rejected.len(),
        "Parsed report"
    );
    parsed
}

/// Fence tracker shared by section and field splitting.
#[derive(Debug, Default)]
struct Fence {
    open: Option<usize>,
}

impl Fence {
    /// Feed a line; returns true if the line belongs to a fence.
    fn step(&mut self, line: &str) -> bool {
        match self.open {
            Some(len) => {
                if closes_fence(line, len) {
                    self.open = None;
                }
                true
            }
            None => match fence_len(line) {
                Some(len) => {
                    self.open = Some(len);
                    true
                }
                None => false,
            },
        }
    }
}

fn fence_len(line: &str) -> Option<usize> {
    FENCE_RE.captures(line).map(|caps| caps[1].len())
}

fn closes_fence(line: &str, open_len: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= open_len && trimmed.chars().all(|c| c == '`')
}

fn split_sections(text: &str) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    let mut current: Option<Section<'_>> = None;
    let mut fence = Fence::default();

    for (index, line) in text.lines().enumerate() {
        if fence.step(line) {
            if let Some(section) = current.as_mut() {
                section.body.push(line);
            }
            continue;
        }

        if let Some(caps) = SECTION_RE.captures(line) {
            sections.extend(current.take());
            current = Some(Section {
                id: caps[1].to_string(),
                line: index + 1,
                body: Vec::new(),
            });
        } else if TOP_HEADING_RE.is_match(line) {
            sections.extend(current.take());
        } else if let Some(section) = current.as_mut() {
            section.body.push(line);
        }
    }

    sections.extend(current);
    sections
}

/// Split a section body into labeled fields, keyed by lowercase label.
///
/// Only the first occurrence of a label is kept.
fn split_fields<'a>(body: &[&'a str]) -> Vec<(String, Field<'a>)> {
    let mut fields: Vec<(String, Field<'a>)> = Vec::new();
    let mut current: Option<(String, Field<'a>)> = None;
    let mut fence = Fence::default();

    for &line in body {
        if fence.step(line) {
            if let Some((_, field)) = current.as_mut() {
                field.block.push(line);
            }
            continue;
        }

        if line.trim() == SEPARATOR {
            fields.extend(current.take());
            continue;
        }

        if let Some(caps) = LABEL_RE.captures(line) {
            fields.extend(current.take());
            let inline = caps.get(2).map_or("", |m| m.as_str());
            current = Some((
                caps[1].to_ascii_lowercase(),
                Field {
                    inline,
                    block: Vec::new(),
                },
            ));
        } else if let Some((_, field)) = current.as_mut() {
            field.block.push(line);
        }
    }

    fields.extend(current);

    let mut seen = HashSet::new();
    fields.retain(|(label, _)| seen.insert(label.clone()));
    fields
}

fn field<'f, 'a>(fields: &'f [(String, Field<'a>)], label: &str) -> Option<&'f Field<'a>> {
    let label = label.to_ascii_lowercase();
    fields.iter().find(|(l, _)| *l == label).map(|(_, f)| f)
}

fn decode_section(section: &Section<'_>) -> Result<BugRecord, String> {
    if section.id.is_empty() {
        return Err("missing id".to_string());
    }
    let fields = split_fields(&section.body);

    let description = field(&fields, LABEL_DESCRIPTION)
        .and_then(extract_text)
        .ok_or("missing description")?;
    let severity = field(&fields, LABEL_SEVERITY)
        .map(|f| f.inline)
        .filter(|v| !v.is_empty())
        .ok_or("missing severity")?;
    let severity = extract_severity(severity)?;
    let status = field(&fields, LABEL_STATUS)
        .map(|f| f.inline)
        .filter(|v| !v.is_empty())
        .ok_or("missing status")?;
    let status = extract_status(status)?;

    let file = field(&fields, LABEL_FILE)
        .map(|f| f.inline.trim().to_string())
        .unwrap_or_default();
    let is_standalone = file.is_empty();

    let (line, column, code) = if is_standalone {
        (0, 0, String::new())
    } else {
        (
            field(&fields, LABEL_LINE)
                .and_then(|f| extract_position(f.inline))
                .unwrap_or(0),
            field(&fields, LABEL_COLUMN)
                .and_then(|f| extract_position(f.inline))
                .unwrap_or(0),
            field(&fields, LABEL_CODE).map(extract_code).unwrap_or_default(),
        )
    };

    let created_at = timestamp_or_now(field(&fields, LABEL_CREATED), &section.id);
    let updated_at = timestamp_or_now(field(&fields, LABEL_UPDATED), &section.id).max(created_at);

    let solution = field(&fields, LABEL_SOLUTION).and_then(extract_solution);

    Ok(BugRecord {
        id: section.id.clone(),
        file,
        line,
        column,
        description,
        severity,
        status,
        created_at,
        updated_at,
        code,
        solution,
        is_standalone,
    })
}

fn timestamp_or_now(field: Option<&Field<'_>>, id: &str) -> DateTime<Utc> {
    field
        .and_then(|f| extract_timestamp(f.inline))
        .unwrap_or_else(|| {
            debug!(id, "Missing or unparseable timestamp, using now");
            now_millis()
        })
}

// ── Extractors ───────────────────────────────────────────────

/// Text of a blockquote, with the quote markers removed.
///
/// Only the marker (`> ` or a bare `>`) is stripped; the rest of each line
/// is kept as written. Returns `None` if the block holds no quote.
#[must_use]
pub fn extract_quote(block: &[&str]) -> Option<String> {
    let quoted: Vec<&str> = block
        .iter()
        .copied()
        .skip_while(|l| l.trim().is_empty())
        .take_while(|l| l.starts_with('>'))
        .map(|l| l.strip_prefix("> ").unwrap_or(&l[1..]))
        .collect();

    if quoted.is_empty() {
        None
    } else {
        Some(quoted.join("\n"))
    }
}

/// Free text of a field: a blockquote, else the inline value, else the
/// non-blank lines that follow.
///
/// Quoted text is returned verbatim; inline and plain text are trimmed.
#[must_use]
pub fn extract_text(field: &Field<'_>) -> Option<String> {
    if let Some(quoted) = extract_quote(&field.block) {
        return (!quoted.trim().is_empty()).then_some(quoted);
    }

    let text = if field.inline.is_empty() {
        plain_block(&field.block)
    } else {
        field.inline.trim().to_string()
    };
    (!text.is_empty()).then_some(text)
}

fn plain_block(block: &[&str]) -> String {
    block
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip a leading symbol (`🟠 high` → `high`).
fn strip_symbol(value: &str) -> &str {
    value.trim_start_matches(|c: char| !c.is_ascii_alphanumeric())
}

/// Severity value, symbol optional, synonyms accepted.
///
/// # Errors
///
/// Returns the rejection reason for an unknown value.
pub fn extract_severity(value: &str) -> Result<Severity, String> {
    let bare = strip_symbol(value);
    normalize_severity(bare).map_err(|_| format!("unknown severity '{}'", value.trim()))
}

/// Status value, symbol optional, synonyms accepted.
///
/// # Errors
///
/// Returns the rejection reason for an unknown value.
pub fn extract_status(value: &str) -> Result<Status, String> {
    let bare = strip_symbol(value);
    normalize_status(bare).map_err(|_| format!("unknown status '{}'", value.trim()))
}

/// A 1-based number, returned zero-based.
#[must_use]
pub fn extract_position(value: &str) -> Option<u32> {
    let n = value.trim().parse::<u64>().ok()?;
    u32::try_from(n.saturating_sub(1)).ok()
}

/// Contents of the first code fence in a field, else its inline value.
#[must_use]
pub fn extract_code(field: &Field<'_>) -> String {
    let mut lines = field.block.iter();
    let Some(open_len) = lines.by_ref().find_map(|l| fence_len(l)) else {
        return field.inline.trim().to_string();
    };

    let code: Vec<&str> = lines
        .take_while(|l| !closes_fence(l, open_len))
        .copied()
        .collect();
    code.join("\n")
}

/// Timestamp value.
#[must_use]
pub fn extract_timestamp(value: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(value)
}

/// Solution: quoted text is always a solution, the bare sentinel means
/// none, and any other inline text is taken literally.
#[must_use]
pub fn extract_solution(field: &Field<'_>) -> Option<String> {
    if let Some(quoted) = extract_quote(&field.block) {
        return Some(quoted);
    }

    let inline = field.inline.trim();
    if inline == NO_SOLUTION {
        return None;
    }
    if !inline.is_empty() {
        return Some(inline.to_string());
    }

    let plain = plain_block(&field.block);
    (!plain.is_empty()).then_some(plain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;
    use crate::sync::render::render_report;

    fn field_of<'a>(inline: &'a str, block: &[&'a str]) -> Field<'a> {
        Field {
            inline,
            block: block.to_vec(),
        }
    }

    fn sample() -> Vec<BugRecord> {
        let mut located = BugRecord::new(
            Some(Location::new("/work/src/a.py", 9, 1)),
            "off-by-one\n\nloop runs ```n + 1``` times",
            Severity::High,
        )
        .with_code("for i in range(n + 1):");
        located.status = Status::Resolved;
        located.touch();
        located.solution = Some("clamp\n---\n### the bound".into());

        let standalone = BugRecord::new(None, "flaky CI", Severity::Critical);

        let mut literal = BugRecord::new(None, "sentinel text", Severity::Low);
        literal.solution = Some(NO_SOLUTION.into());

        vec![located, standalone, literal]
    }

    #[test]
    fn test_round_trip() {
        let records = sample();
        let parsed = parse_report(&render_report(&records));

        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.records.len(), records.len());
        for original in &records {
            let decoded = parsed
                .records
                .iter()
                .find(|r| r.id == original.id)
                .unwrap();
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn test_code_with_fences_round_trips() {
        let bug = BugRecord::new(Some(Location::new("/a.md", 0, 0)), "fence", Severity::Low)
            .with_code("```rust");
        let parsed = parse_report(&render_report(std::slice::from_ref(&bug)));
        assert_eq!(parsed.records[0].code, "```rust");
    }

    #[test]
    fn test_preamble_and_summary_ignored() {
        let text = "# Bug Report\n\n_Generated: now_\n\n## Summary\n\n| x | y |\n\n## Bugs\n\n_No bugs recorded._\n";
        let parsed = parse_report(text);
        assert!(parsed.records.is_empty());
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn test_hand_written_section() {
        let text = "\
### bug_hand
**description:** typo in banner
**Severity:** major
**Status:** WIP
**File:** /srv/app.rs
**Line:** 3
**Solution:** fix the spelling
";
        let parsed = parse_report(text);
        let bug = &parsed.records[0];
        assert_eq!(bug.description, "typo in banner");
        assert_eq!(bug.severity, Severity::High);
        assert_eq!(bug.status, Status::InProgress);
        assert_eq!(bug.line, 2);
        assert_eq!(bug.column, 0);
        assert!(!bug.is_standalone);
        assert_eq!(bug.solution.as_deref(), Some("fix the spelling"));
        assert!(bug.updated_at >= bug.created_at);
    }

    #[test]
    fn test_invalid_sections_are_rejected_individually() {
        let text = "\
### bug_ok
**Description:** fine
**Severity:** low
**Status:** open
---
### bug_nostatus
**Description:** no status
**Severity:** low
---
### bug_badsev
**Description:** bad severity
**Severity:** 🟣 cosmic
**Status:** open
---
### bug_ok
**Description:** duplicate
**Severity:** low
**Status:** open
";
        let parsed = parse_report(text);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].description, "fine");
        assert!(parsed.records[0].is_standalone);

        let reasons: Vec<&str> = parsed.rejected.iter().map(|r| r.reason.as_str()).collect();
        assert_eq!(reasons[0], "missing status");
        assert!(reasons[1].contains("cosmic"));
        assert_eq!(reasons[2], "duplicate id");
        assert_eq!(parsed.rejected[1].line, 10);
    }

    #[test]
    fn test_first_label_wins() {
        let fields = split_fields(&["**Status:** open", "**status:** closed"]);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].1.inline, "open");
    }

    #[test]
    fn test_split_fields_respects_fences() {
        let body = [
            "**Code:**",
            "```",
            "**Status:** closed",
            "---",
            "```",
            "**Status:** open",
        ];
        let fields = split_fields(&body);
        assert_eq!(fields.len(), 2);
        assert_eq!(extract_code(&fields[0].1), "**Status:** closed\n---");
        assert_eq!(fields[1].1.inline, "open");
    }

    #[test]
    fn test_extract_quote() {
        assert_eq!(
            extract_quote(&["", "> a", ">", "> b", "", "> c"]).as_deref(),
            Some("a\n\nb")
        );
        assert_eq!(extract_quote(&["plain"]), None);
        assert_eq!(extract_quote(&[">  indented"]).as_deref(), Some(" indented"));
    }

    #[test]
    fn test_extract_text() {
        assert_eq!(
            extract_text(&field_of("", &["", "> quoted"])).as_deref(),
            Some("quoted")
        );
        assert_eq!(extract_text(&field_of("inline", &[])).as_deref(), Some("inline"));
        assert_eq!(
            extract_text(&field_of("", &["para one", "para two"])).as_deref(),
            Some("para one\npara two")
        );
        assert_eq!(extract_text(&field_of("", &["", ">"])), None);
    }

    #[test]
    fn test_extract_enums() {
        assert_eq!(extract_severity("🔴 critical"), Ok(Severity::Critical));
        assert_eq!(extract_severity("Low"), Ok(Severity::Low));
        assert_eq!(extract_severity("blocker"), Ok(Severity::Critical));
        assert!(extract_severity("🟣").is_err());

        assert_eq!(extract_status("🟡 in-progress"), Ok(Status::InProgress));
        assert_eq!(extract_status("⚪ closed"), Ok(Status::Closed));
        assert_eq!(extract_status("fixed"), Ok(Status::Resolved));
        assert!(extract_status("lost").is_err());
    }

    #[test]
    fn test_extract_position() {
        assert_eq!(extract_position("10"), Some(9));
        assert_eq!(extract_position(" 1 "), Some(0));
        assert_eq!(extract_position("0"), Some(0));
        assert_eq!(extract_position("ten"), None);
        assert_eq!(extract_position("4294967296"), Some(u32::MAX));
        assert_eq!(extract_position("4294967297"), None);
    }

    #[test]
    fn test_last_line_round_trips() {
        let bug = BugRecord::new(
            Some(Location::new("/big.log", u32::MAX, u32::MAX)),
            "far down",
            Severity::Low,
        );
        let parsed = parse_report(&render_report(std::slice::from_ref(&bug)));
        assert_eq!(parsed.records[0].line, u32::MAX);
        assert_eq!(parsed.records[0].column, u32::MAX);
    }

    #[test]
    fn test_quoted_text_keeps_whitespace() {
        let block = ["", "> a  ", ">    ", "> b"];
        assert_eq!(extract_quote(&block).as_deref(), Some("a  \n   \nb"));
        assert_eq!(
            extract_text(&field_of("", &block)).as_deref(),
            Some("a  \n   \nb")
        );
        assert_eq!(
            extract_solution(&field_of("", &block)).as_deref(),
            Some("a  \n   \nb")
        );
        assert_eq!(
            extract_text(&field_of("  inline  ", &[])).as_deref(),
            Some("inline")
        );
    }

    #[test]
    fn test_extract_code() {
        let fenced = field_of("", &["", "````", "a ``` b", "````", ""]);
        assert_eq!(extract_code(&fenced), "a ``` b");
        assert_eq!(extract_code(&field_of("", &["```", "```"])), "");
        assert_eq!(extract_code(&field_of("x = 1", &[])), "x = 1");
    }

    #[test]
    fn test_extract_timestamp() {
        assert!(extract_timestamp("2024-06-01T12:00:00.123Z").is_some());
        assert!(extract_timestamp("soon").is_none());
    }

    #[test]
    fn test_extract_solution() {
        assert_eq!(extract_solution(&field_of(NO_SOLUTION, &[])), None);
        assert_eq!(
            extract_solution(&field_of("", &["", "> _Pending_"])).as_deref(),
            Some(NO_SOLUTION)
        );
        assert_eq!(
            extract_solution(&field_of("restart it", &[])).as_deref(),
            Some("restart it")
        );
        assert_eq!(extract_solution(&field_of("", &[""])), None);
    }
}
