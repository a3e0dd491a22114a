//! Change notifications for store listeners.
//!
//! Views that render from the store (the bug list, per-file markers)
//! register a listener and are called synchronously after every applied
//! mutation, in registration order.

use crate::model::{BugRecord, Status};

/// What changed in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added { id: String },
    Removed { id: String },
    StatusChanged { id: String, from: Status, to: Status },
    SolutionChanged { id: String },
    Merged { ids: Vec<String> },
}

impl StoreEvent {
    /// Get the string representation for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Added { .. } => "bug_added",
            Self::Removed { .. } => "bug_removed",
            Self::StatusChanged { .. } => "status_changed",
            Self::SolutionChanged { .. } => "solution_changed",
            Self::Merged { .. } => "bugs_merged",
        }
    }

    /// IDs of the bugs this event touches.
    #[must_use]
    pub fn bug_ids(&self) -> Vec<&str> {
        match self {
            Self::Added { id }
            | Self::Removed { id }
            | Self::StatusChanged { id, .. }
            | Self::SolutionChanged { id } => vec![id.as_str()],
            Self::Merged { ids } => ids.iter().map(String::as_str).collect(),
        }
    }
}

/// Callback invoked with the event and the full record list after the change.
pub type Listener = Box<dyn FnMut(&StoreEvent, &[BugRecord])>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registered listeners.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    /// Register a listener.
    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Call every listener with `event`.
    pub fn notify(&mut self, event: &StoreEvent, records: &[BugRecord]) {
        for (_, listener) in &mut self.entries {
            listener(event, records);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
