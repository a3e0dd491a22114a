//! Inline markers for bugs in an open file.

use serde::Serialize;

use crate::model::BugRecord;
use crate::storage::BugStore;

/// A one-character marker at a bug's position (zero-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decoration {
    pub id: String,
    pub line: u32,
    pub start_column: u32,
    pub end_column: u32,
    pub hover: String,
}

impl Decoration {
    #[must_use]
    pub fn from_record(bug: &BugRecord) -> Self {
        Self {
            id: bug.id.clone(),
            line: bug.line,
            start_column: bug.column,
            end_column: bug.column.saturating_add(1),
            hover: format!(
                "🐛 {}\nSeverity: {}\nStatus: {}",
                bug.description, bug.severity, bug.status
            ),
        }
    }
}

/// Markers for every located bug in `file`, in line order.
#[must_use]
pub fn decorations_for(store: &BugStore, file: &str) -> Vec<Decoration> {
    let mut marks: Vec<Decoration> = store
        .list_for_location(file)
        .into_iter()
        .filter(|bug| !bug.is_standalone)
        .map(Decoration::from_record)
        .collect();
    marks.sort_by_key(|d| (d.line, d.start_column));
    marks
}
