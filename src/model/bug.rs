//! Bug record model.
//!
//! A bug is either pinned to a source location (file, zero-based line and
//! column, plus a snapshot of the line's text) or a standalone note with no
//! location at all.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// How bad a bug is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities, most severe first (quick-pick order).
    pub const ALL: [Self; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Report symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Critical => "🔴",
            Self::High => "🟠",
            Self::Medium => "🟡",
            Self::Low => "🟢",
        }
    }

    /// Theme icon name used by the sidebar tree.
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        match self {
            Self::Critical => "error",
            Self::High => "warning",
            Self::Medium => "info",
            Self::Low => "circle-outline",
        }
    }

    /// Exact, case-insensitive parse of the storage string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Medium
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a bug is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Resolved, Self::Closed];

    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
        }
    }

    /// Report symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Open => "🔴",
            Self::InProgress => "🟡",
            Self::Resolved => "🟢",
            Self::Closed => "⚪",
        }
    }

    /// Theme icon name used by the sidebar tree.
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        match self {
            Self::Open => "circle-outline",
            Self::InProgress => "sync",
            Self::Resolved => "check",
            Self::Closed => "pass",
        }
    }

    /// Exact, case-insensitive parse of the storage string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Open
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A zero-based position in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

/// A bug report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugRecord {
    /// Unique identifier (`bug_` + 12 hex chars)
    pub id: String,

    /// Absolute path of the file, empty for standalone bugs
    pub file: String,

    /// Zero-based line
    pub line: u32,

    /// Zero-based column
    pub column: u32,

    pub description: String,

    pub severity: Severity,

    pub status: Status,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Trimmed text of the source line when the bug was recorded
    pub code: String,

    /// Resolution notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,

    pub is_standalone: bool,
}

impl BugRecord {
    /// Create an open bug with a fresh id.
    ///
    /// `location: None` makes a standalone bug. The code snapshot starts
    /// empty; the store fills it in from its line source.
    pub fn new(location: Option<Location>, description: &str, severity: Severity) -> Self {
        let now = now_millis();
        let (file, line, column, is_standalone) = match location {
            Some(loc) => (loc.file, loc.line, loc.column, false),
            None => (String::new(), 0, 0, true),
        };

        Self {
            id: new_bug_id(),
            file,
            line,
            column,
            description: description.to_string(),
            severity,
            status: Status::Open,
            created_at: now,
            updated_at: now,
            code: String::new(),
            solution: None,
            is_standalone,
        }
    }

    /// Set the resolution notes.
    #[must_use]
    pub fn with_solution(mut self, solution: &str) -> Self {
        self.solution = Some(solution.to_string());
        self
    }

    /// Set the code snapshot.
    #[must_use]
    pub fn with_code(mut self, code: &str) -> Self {
        self.code = code.to_string();
        self
    }

    /// The record's location, or `None` when standalone.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        if self.is_standalone {
            None
        } else {
            Some(Location::new(self.file.clone(), self.line, self.column))
        }
    }

    /// File name without directories, for compact display.
    #[must_use]
    pub fn file_name(&self) -> &str {
        std::path::Path::new(&self.file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.file)
    }

    /// Presentation order: newest `created_at` first, id as tiebreak.
    #[must_use]
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Advance `updated_at`.
    ///
    /// Always moves forward, by at least one millisecond.
    pub fn touch(&mut self) {
        let now = now_millis();
        let floor = self.updated_at + Duration::milliseconds(1);
        self.updated_at = now.max(floor);
    }
}

/// Per-status tally used by the report summary and `bt summary`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub closed: usize,
}

impl StatusCounts {
    /// Count statuses over a set of records.
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a BugRecord>) -> Self {
        let mut counts = Self::default();
        for record in records {
            *counts.slot(record.status) += 1;
        }
        counts
    }

    /// Count for one status.
    #[must_use]
    pub const fn get(&self, status: Status) -> usize {
        match status {
            Status::Open => self.open,
            Status::InProgress => self.in_progress,
            Status::Resolved => self.resolved,
            Status::Closed => self.closed,
        }
    }

    fn slot(&mut self, status: Status) -> &mut usize {
        match status {
            Status::Open => &mut self.open,
            Status::InProgress => &mut self.in_progress,
            Status::Resolved => &mut self.resolved,
            Status::Closed => &mut self.closed,
        }
    }

    /// Total across all statuses.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.open + self.in_progress + self.resolved + self.closed
    }
}

/// Generate a bug id.
#[must_use]
pub fn new_bug_id() -> String {
    format!("bug_{}", &uuid::Uuid::new_v4().simple().to_string()[..12])
}

/// Current time truncated to milliseconds.
#[must_use]
pub fn now_millis() -> DateTime<Utc> {
    let millis = Utc::now().timestamp_millis();
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Render a timestamp as RFC 3339 without losing sub-second precision.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an RFC 3339 timestamp, or a zone-less one taken as UTC.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
