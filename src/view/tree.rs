//! List items for the bug sidebar.
//!
//! Each bug becomes one flat item. `bt list` renders these as a table, or
//! serializes them for an editor front end.

use serde::Serialize;

use crate::model::BugRecord;
use crate::storage::BugStore;

/// Context value attached to every bug item.
pub const BUG_CONTEXT: &str = "bug";

/// Where activating an item should take the editor (zero-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JumpTarget {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// One row of the bug list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeItem {
    pub id: String,
    /// Primary text: the description.
    pub label: String,
    /// Secondary text: `<file>:<line> [severity] [status]`.
    pub description: String,
    pub tooltip: String,
    /// Theme icon for the severity.
    pub icon: &'static str,
    /// Theme icon for the status.
    pub status_icon: &'static str,
    pub context_value: &'static str,
    /// `None` for standalone bugs.
    pub jump: Option<JumpTarget>,
}

impl TreeItem {
    #[must_use]
    pub fn from_record(bug: &BugRecord) -> Self {
        let place = if bug.is_standalone {
            "standalone".to_string()
        } else {
            format!("{}:{}", bug.file_name(), u64::from(bug.line) + 1)
        };

        let mut tooltip = if bug.is_standalone {
            "Location: standalone\n".to_string()
        } else {
            format!(
                "File: {}\nLine: {}\n",
                bug.file_name(),
                u64::from(bug.line) + 1
            )
        };
        tooltip.push_str(&format!(
            "Severity: {}\nStatus: {}\nDescription: {}",
            bug.severity, bug.status, bug.description
        ));
        if !bug.is_standalone {
            tooltip.push_str(&format!("\nCode: {}", bug.code));
        }
        if let Some(solution) = &bug.solution {
            tooltip.push_str(&format!("\nSolution: {solution}"));
        }

        let jump = bug.location().map(|loc| JumpTarget {
            file: loc.file,
            line: loc.line,
            column: loc.column,
        });

        Self {
            id: bug.id.clone(),
            label: bug.description.clone(),
            description: format!("{place} [{}] [{}]", bug.severity, bug.status),
            tooltip,
            icon: bug.severity.icon(),
            status_icon: bug.status.icon(),
            context_value: BUG_CONTEXT,
            jump,
        }
    }
}

/// All bugs as list items, newest first.
#[must_use]
pub fn build_tree(store: &BugStore) -> Vec<TreeItem> {
    build_items(store.list_sorted())
}

/// List items for an already filtered and sorted selection.
pub fn build_items<'a>(records: impl IntoIterator<Item = &'a BugRecord>) -> Vec<TreeItem> {
    records.into_iter().map(TreeItem::from_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, Severity, Status};
    use crate::storage::NewBug;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_located_item() {
        let mut bug = BugRecord::new(
            Some(Location::new("/work/src/a.py", 9, 1)),
            "off-by-one",
            Severity::High,
        )
        .with_code("for i in range(n + 1):");
        bug.status = Status::InProgress;

        let item = TreeItem::from_record(&bug);
        assert_eq!(item.label, "off-by-one");
        assert_eq!(item.description, "a.py:10 [high] [in-progress]");
        assert_eq!(item.icon, "warning");
        assert_eq!(item.status_icon, "sync");
        assert_eq!(item.context_value, "bug");
        assert!(item.tooltip.starts_with("File: a.py\nLine: 10\n"));
        assert!(item.tooltip.ends_with("Code: for i in range(n + 1):"));
        assert_eq!(
            item.jump,
            Some(JumpTarget {
                file: "/work/src/a.py".into(),
                line: 9,
                column: 1
            })
        );
    }

    #[test]
    fn test_standalone_item() {
        let bug = BugRecord::new(None, "flaky CI", Severity::Critical).with_solution("pin the runner");
        let item = TreeItem::from_record(&bug);

        assert_eq!(item.description, "standalone [critical] [open]");
        assert_eq!(item.icon, "error");
        assert!(item.jump.is_none());
        assert!(!item.tooltip.contains("Code:"));
        assert!(item.tooltip.ends_with("Solution: pin the runner"));
    }

    #[test]
    fn test_build_tree_newest_first() {
        let dir = TempDir::new().unwrap();
        let mut store = BugStore::open(&dir.path().join("bugs.json"))
            .with_line_source(|_: &Path, _: u32| None);
        let first = store.add(NewBug::standalone("first", Severity::Low)).unwrap();
        let second = store.add(NewBug::standalone("second", Severity::Low)).unwrap();

        let items = build_tree(&store);
        assert_eq!(items.len(), 2);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        if first.created_at == second.created_at {
            let mut sorted = vec![first.id.as_str(), second.id.as_str()];
            sorted.sort_unstable();
            assert_eq!(ids, sorted);
        } else {
            assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
        }
    }
}
