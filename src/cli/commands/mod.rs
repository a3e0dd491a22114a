//! Command implementations.

pub mod bug;
pub mod completions;
pub mod sync;
pub mod version;

use tracing::debug;

use crate::config::Paths;
use crate::storage::BugStore;

/// Open the store for a command, with change logging attached.
#[must_use]
pub fn open_store(paths: &Paths) -> BugStore {
    let mut store = BugStore::open(&paths.store).with_report(paths.report.clone());
    let _ = store.subscribe(|event, records| {
        debug!(
            event = event.kind(),
            ids = ?event.bug_ids(),
            total = records.len(),
            "Store changed"
        );
    });
    store
}
