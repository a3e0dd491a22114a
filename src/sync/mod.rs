//! Markdown report sync.
//!
//! The store's JSON file is the source of truth; the markdown report is a
//! readable snapshot of it that can also be read back:
//!
//! - **Render**: bugs → report (summary table, one section per bug)
//! - **Parse**: report → bugs, section by section, rejecting bad sections
//! - **Export**: write the report, skipping unchanged content
//! - **Import**: merge a report into the store by id
//! - **Status**: compare the store with the report on disk
//!
//! # Example
//!
//! ```ignore
//! use bt::sync::{Exporter, Importer};
//!
//! let stats = Exporter::new(&store).export(Path::new("BUGS.md"))?;
//! let stats = Importer::new(&mut store).import(Path::new("BUGS.md"))?;
//! ```

mod export;
mod file;
mod hash;
mod import;
pub mod parse;
pub mod render;
mod status;
mod types;

pub use export::Exporter;
pub use file::{atomic_write, file_size, read_optional};
pub use hash::{has_changed, report_hash};
pub use import::Importer;
pub use parse::{ParsedReport, parse_report};
pub use render::{STANDALONE_MARKER, render_report, render_report_at};
pub use status::{get_report_status, print_status};
pub use types::{ExportStats, ImportStats, Rejected, ReportStatus, SyncError, SyncResult};
