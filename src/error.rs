//! Error types for the bug tracker.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=storage, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::SyncError;

/// Result type alias for bug tracker operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Storage (exit 2)
    PersistError,

    // Not Found (exit 3)
    BugNotFound,

    // Validation (exit 4)
    InvalidStatus,
    InvalidSeverity,
    InvalidLocation,
    InvalidArgument,
    RequiredField,

    // Report sync (exit 6)
    SyncError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::PersistError => "PERSIST_ERROR",
            Self::BugNotFound => "BUG_NOT_FOUND",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::InvalidSeverity => "INVALID_SEVERITY",
            Self::InvalidLocation => "INVALID_LOCATION",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::SyncError => "SYNC_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::PersistError => 2,
            Self::BugNotFound => 3,
            Self::InvalidStatus
            | Self::InvalidSeverity
            | Self::InvalidLocation
            | Self::InvalidArgument
            | Self::RequiredField => 4,
            Self::SyncError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether a retry with corrected input could succeed.
    ///
    /// True for validation errors and for persistence failures (the
    /// in-memory state survives and the next save rewrites everything).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidStatus
                | Self::InvalidSeverity
                | Self::InvalidLocation
                | Self::InvalidArgument
                | Self::RequiredField
                | Self::PersistError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in bug tracker operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Bug not found: {id}")]
    BugNotFound { id: String },

    #[error("Bug not found: {id} (did you mean: {}?)", similar.join(", "))]
    BugNotFoundSimilar { id: String, similar: Vec<String> },

    #[error("Invalid status '{value}'")]
    InvalidStatus {
        value: String,
        suggestion: Option<String>,
    },

    #[error("Invalid severity '{value}'")]
    InvalidSeverity {
        value: String,
        suggestion: Option<String>,
    },

    #[error("Invalid location '{0}': expected <file>:<line>[:<column>]")]
    InvalidLocation(String),

    #[error("Missing required field: {0}")]
    RequiredField(&'static str),

    #[error("Failed to save {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Report error: {0}")]
    Sync(#[from] SyncError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::BugNotFound { .. } | Self::BugNotFoundSimilar { .. } => ErrorCode::BugNotFound,
            Self::InvalidStatus { .. } => ErrorCode::InvalidStatus,
            Self::InvalidSeverity { .. } => ErrorCode::InvalidSeverity,
            Self::InvalidLocation(_) => ErrorCode::InvalidLocation,
            Self::RequiredField(_) => ErrorCode::RequiredField,
            Self::Persist { .. } => ErrorCode::PersistError,
            Self::Sync(_) => ErrorCode::SyncError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::BugNotFound { id } => Some(format!(
                "No bug with ID '{id}'. Use `bt list` to see recorded bugs."
            )),
            Self::BugNotFoundSimilar { similar, .. } => {
                Some(format!("Did you mean: {}?", similar.join(", ")))
            }

            Self::InvalidStatus { suggestion, .. } => Some(match suggestion {
                Some(s) => format!("Did you mean '{s}'? Valid: open, in-progress, resolved, closed"),
                None => "Valid statuses: open, in-progress, resolved, closed. \
                         Synonyms: wip→in-progress, fixed→resolved, done→closed"
                    .to_string(),
            }),

            Self::InvalidSeverity { suggestion, .. } => Some(match suggestion {
                Some(s) => format!("Did you mean '{s}'? Valid: low, medium, high, critical"),
                None => "Valid severities: low, medium, high, critical".to_string(),
            }),

            Self::InvalidLocation(_) => {
                Some("Example: --at src/main.rs:42:7 (line and column are 1-based)".to_string())
            }

            Self::Persist { path, .. } => Some(format!(
                "The change was applied in memory but {} could not be written. \
                 Check permissions or pass --store to choose another file.",
                path.display()
            )),

            Self::Config(_) => Some(
                "Set BT_STORE / BT_REPORT or pass --store / --report explicitly".to_string(),
            ),

            Self::RequiredField(_)
            | Self::Sync(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
