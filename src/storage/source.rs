//! Source line lookup for code snapshots.

use std::path::Path;

use tracing::trace;

/// Reads the text of one line of a source file.
///
/// Lookups are best-effort: any failure (missing file, unreadable bytes,
/// line past the end) is `None`, never an error.
pub trait LineSource {
    /// Text of zero-based `line` in `file`, without the line terminator.
    fn read_line(&self, file: &Path, line: u32) -> Option<String>;
}

/// Reads lines straight from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLineSource;

impl LineSource for FsLineSource {
    fn read_line(&self, file: &Path, line: u32) -> Option<String> {
        let bytes = match std::fs::read(file) {
            Ok(bytes) => bytes,
            Err(e) => {
                trace!(file = %file.display(), error = %e, "Source file unreadable");
                return None;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        text.lines().nth(line as usize).map(ToString::to_string)
    }
}

impl<F> LineSource for F
where
    F: Fn(&Path, u32) -> Option<String>,
{
    fn read_line(&self, file: &Path, line: u32) -> Option<String> {
        self(file, line)
    }
}
