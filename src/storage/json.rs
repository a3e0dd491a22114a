//! JSON encoding of the bug store file.
//!
//! The store file is a pretty-printed JSON array of bug objects. Loading
//! never fails: a missing or unparseable file is an empty store, and each
//! entry is validated on its own so one bad entry does not take the rest
//! down with it.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{BugRecord, Severity, Status, now_millis, parse_timestamp};

/// Outcome of loading the store file.
#[derive(Debug, Default, Clone, Serialize)]
pub struct LoadReport {
    /// Entries accepted into the store.
    pub loaded: usize,
    /// Entries dropped by validation.
    pub rejected: Vec<RejectedEntry>,
    /// Why the whole file was ignored, if it was.
    pub file_error: Option<String>,
}

/// A store entry that failed validation.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedEntry {
    /// Position in the JSON array.
    pub index: usize,
    /// The entry's id, when it had a usable one.
    pub id: Option<String>,
    pub reason: String,
}

/// Loose view of one entry before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBug {
    id: Option<String>,
    file: Option<String>,
    line: Option<u32>,
    column: Option<u32>,
    description: Option<String>,
    severity: Option<String>,
    status: Option<String>,
    created_at: Option<Value>,
    updated_at: Option<Value>,
    code: Option<String>,
    solution: Option<String>,
    is_standalone: Option<bool>,
}

/// Load records from the store file.
///
/// A missing file is a fresh start; so is a file that is not a JSON array.
pub fn load_records(path: &Path) -> (Vec<BugRecord>, LoadReport) {
    match std::fs::read_to_string(path) {
        Ok(text) => decode_records(&text),
        Err(e) => {
            if e.kind() == std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), "No store file yet, starting empty");
            } else {
                warn!(path = %path.display(), error = %e, "Store file unreadable, starting empty");
            }
            let report = LoadReport {
                file_error: Some(e.to_string()),
                ..LoadReport::default()
            };
            (Vec::new(), report)
        }
    }
}

/// Decode and validate the store file's contents.
pub fn decode_records(text: &str) -> (Vec<BugRecord>, LoadReport) {
    let mut report = LoadReport::default();

    let entries: Vec<Value> = match serde_json::from_str(text) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Store file is not a JSON array, starting empty");
            report.file_error = Some(e.to_string());
            return (Vec::new(), report);
        }
    };

    let mut records = Vec::with_capacity(entries.len());
    let mut seen = HashSet::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let id = entry
            .get("id")
            .and_then(Value::as_str)
            .map(ToString::to_string);

        let result = decode_entry(entry).and_then(|record| {
            if seen.insert(record.id.clone()) {
                Ok(record)
            } else {
                Err("duplicate id".to_string())
            }
        });

        match result {
            Ok(record) => records.push(record),
            Err(reason) => {
                warn!(index, id = ?id, %reason, "Rejected store entry");
                report.rejected.push(RejectedEntry { index, id, reason });
            }
        }
    }

    report.loaded = records.len();
    (records, report)
}

/// Validate one entry into a record.
fn decode_entry(entry: Value) -> Result<BugRecord, String> {
    let raw: RawBug = serde_json::from_value(entry).map_err(|e| e.to_string())?;

    let id = raw
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or("missing id")?;
    let description = raw
        .description
        .filter(|d| !d.trim().is_empty())
        .ok_or("missing description")?;
    let severity = raw.severity.ok_or("missing severity")?;
    let severity =
        Severity::parse(&severity).ok_or_else(|| format!("unknown severity '{severity}'"))?;
    let status = raw.status.ok_or("missing status")?;
    let status = Status::parse(&status).ok_or_else(|| format!("unknown status '{status}'"))?;

    let file = raw.file.unwrap_or_default();
    let is_standalone = raw.is_standalone.unwrap_or(false) || file.is_empty();

    let created_at = revive_timestamp(raw.created_at.as_ref(), &id, "createdAt");
    let updated_at = revive_timestamp(raw.updated_at.as_ref(), &id, "updatedAt").max(created_at);

    Ok(BugRecord {
        id,
        file,
        line: raw.line.unwrap_or(0),
        column: raw.column.unwrap_or(0),
        description,
        severity,
        status,
        created_at,
        updated_at,
        code: raw.code.unwrap_or_default(),
        solution: raw.solution.filter(|s| !s.trim().is_empty()),
        is_standalone,
    })
}

/// Timestamps may be RFC 3339 strings or epoch milliseconds.
fn revive_timestamp(value: Option<&Value>, id: &str, field: &str) -> chrono::DateTime<chrono::Utc> {
    let parsed = match value {
        Some(Value::String(s)) => parse_timestamp(s),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(chrono::DateTime::from_timestamp_millis),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        debug!(id, field, "Unparseable timestamp, using now");
        now_millis()
    })
}

/// Encode records for the store file.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_records(records: &[BugRecord]) -> serde_json::Result<String> {
    let mut json = serde_json::to_string_pretty(records)?;
    json.push('\n');
    Ok(json)
}
