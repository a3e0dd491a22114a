//! Configuration management.
//!
//! This module resolves where the bug store and the markdown report live.
//!
//! # Layout
//!
//! - **Store**: `bugs.json`, in the workspace's `.bugtracker/` directory when
//!   one exists, else in the global `~/.bugtracker/`
//! - **Report**: `BUGS.md` at the workspace root, else in `~/.bugtracker/`
//!
//! Explicit flags win over environment variables (`BT_STORE`, `BT_REPORT`,
//! `BT_WORKSPACE`), which win over discovery.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Location;

/// Name of the per-workspace and global data directory.
pub const DATA_DIR: &str = ".bugtracker";
pub const STORE_FILE: &str = "bugs.json";
pub const REPORT_FILE: &str = "BUGS.md";

/// Resolved file locations for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub store: PathBuf,
    /// Regenerated on every save; `None` disables it.
    pub report: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
}

/// Get the global data directory (`~/.bugtracker/`).
#[must_use]
pub fn global_bugtracker_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(DATA_DIR))
}

/// Get the git repository root directory.
#[must_use]
pub fn git_toplevel() -> Option<PathBuf> {
    std::process::Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| PathBuf::from(String::from_utf8_lossy(&o.stdout).trim().to_string()))
        .filter(|p| !p.as_os_str().is_empty())
}

/// Find the workspace root starting from `start`.
///
/// Resolution strategy:
/// 1. The git root, if it has a `.bugtracker/` directory
/// 2. The nearest ancestor of `start` with a `.bugtracker/` directory
/// 3. The git root itself
#[must_use]
pub fn discover_workspace_from(start: &Path, git_root: Option<&Path>) -> Option<PathBuf> {
    if let Some(root) = git_root {
        if root.join(DATA_DIR).is_dir() {
            return Some(root.to_path_buf());
        }
    }

    if let Some(found) = start.ancestors().find(|dir| dir.join(DATA_DIR).is_dir()) {
        return Some(found.to_path_buf());
    }

    git_root.map(Path::to_path_buf)
}

/// Find the workspace root from the current directory.
#[must_use]
pub fn discover_workspace() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    discover_workspace_from(&cwd, git_toplevel().as_deref())
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Resolve the workspace root.
///
/// Priority:
/// 1. `explicit` (from `--workspace`)
/// 2. `BT_WORKSPACE` environment variable
/// 3. Discovery from the current directory
#[must_use]
pub fn resolve_workspace(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env_path("BT_WORKSPACE"))
        .or_else(discover_workspace)
}

/// Resolve the store file.
///
/// Priority:
/// 1. `explicit` (from `--store`)
/// 2. `BT_STORE` environment variable
/// 3. `<workspace>/.bugtracker/bugs.json` if that directory exists
/// 4. `~/.bugtracker/bugs.json`
#[must_use]
pub fn resolve_store_path(explicit: Option<&Path>, workspace: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_path("BT_STORE") {
        return Some(path);
    }
    if let Some(dir) = workspace.map(|ws| ws.join(DATA_DIR)).filter(|d| d.is_dir()) {
        return Some(dir.join(STORE_FILE));
    }
    global_bugtracker_dir().map(|dir| dir.join(STORE_FILE))
}

/// Resolve the report file.
///
/// Priority:
/// 1. `explicit` (from `--report`)
/// 2. `BT_REPORT` environment variable
/// 3. `<workspace>/BUGS.md`
/// 4. `~/.bugtracker/BUGS.md`
#[must_use]
pub fn resolve_report_path(explicit: Option<&Path>, workspace: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_path("BT_REPORT") {
        return Some(path);
    }
    if let Some(ws) = workspace {
        return Some(ws.join(REPORT_FILE));
    }
    global_bugtracker_dir().map(|dir| dir.join(REPORT_FILE))
}

/// Resolve every location for one invocation.
///
/// # Errors
///
/// Returns `Config` if no store location can be determined (no flag, no
/// environment variable and no home directory).
pub fn resolve_paths(
    store: Option<&Path>,
    report: Option<&Path>,
    workspace: Option<&Path>,
) -> Result<Paths> {
    let workspace = resolve_workspace(workspace);
    let store = resolve_store_path(store, workspace.as_deref())
        .ok_or_else(|| Error::Config("Could not determine the bug store location".to_string()))?;
    let report = resolve_report_path(report, workspace.as_deref());

    debug!(
        store = %store.display(),
        report = ?report,
        workspace = ?workspace,
        "Resolved paths"
    );

    Ok(Paths {
        store,
        report,
        workspace,
    })
}

/// Make `path` absolute against the current directory.
///
/// Bugs are keyed by absolute path, so relative input from the command line
/// goes through here. The path does not have to exist.
#[must_use]
pub fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Parse `file:line[:column]` (1-based) into a zero-based location.
///
/// The file part is made absolute.
///
/// # Errors
///
/// Returns `InvalidLocation` if the line or column is missing, not a
/// number, or zero.
pub fn parse_location(input: &str) -> Result<Location> {
    let invalid = || Error::InvalidLocation(input.to_string());

    let (rest, last) = input.rsplit_once(':').ok_or_else(invalid)?;
    let last: u32 = last.trim().parse().map_err(|_| invalid())?;

    // A second numeric suffix makes `last` the column.
    let (file, line, column) = match rest.rsplit_once(':') {
        Some((file, line)) if !file.is_empty() && line.trim().parse::<u32>().is_ok() => {
            let line: u32 = line.trim().parse().map_err(|_| invalid())?;
            (file, line, last)
        }
        _ => (rest, last, 1),
    };

    if file.trim().is_empty() || line == 0 || column == 0 {
        return Err(invalid());
    }

    let file = absolute_path(Path::new(file.trim()));
    Ok(Location::new(
        file.to_string_lossy().to_string(),
        line - 1,
        column - 1,
    ))
}
