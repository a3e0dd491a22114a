//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for list/query commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values
    Csv,
}

pub mod commands;

/// bt - pin bugs to source lines and keep a markdown report of them
#[derive(Parser, Debug)]
#[command(name = "bt", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store file (default: <workspace>/.bugtracker/bugs.json or ~/.bugtracker/bugs.json)
    #[arg(long, global = true, env = "BT_STORE")]
    pub store: Option<PathBuf>,

    /// Markdown report regenerated on every change (default: <workspace>/BUGS.md)
    #[arg(long, global = true, env = "BT_REPORT")]
    pub report: Option<PathBuf>,

    /// Do not regenerate the markdown report on changes (overrides --report)
    #[arg(long, global = true)]
    pub no_report: bool,

    /// Workspace root (default: discovered from the current directory)
    #[arg(long, global = true, env = "BT_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Output only the ID (for scripting)
    #[arg(long, global = true)]
    pub silent: bool,

    /// Preview changes without writing the store
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a bug at a source location
    Add(AddArgs),

    /// Record a bug that is not tied to a location
    Note(NoteArgs),

    /// Remove bugs by ID (unknown IDs are reported, not errors)
    #[command(alias = "rm")]
    Remove {
        /// IDs of the bugs to remove
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Change a bug's status
    SetStatus {
        /// Bug ID
        id: String,

        /// New status (open, in-progress, resolved, closed)
        status: String,
    },

    /// Record or clear a bug's solution
    Solve(SolveArgs),

    /// List bugs, newest first
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one bug in full
    Show {
        /// Bug ID
        id: String,
    },

    /// Show the inline markers for a file
    Marks {
        /// File to show markers for
        file: PathBuf,
    },

    /// Write the markdown report
    Export {
        /// Output path (default: the configured report)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge bugs from a markdown report into the store
    Import {
        /// Report to read (default: the configured report)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show status counts and report state
    Summary,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// What is wrong
    pub description: String,

    /// Location as <file>:<line>[:<column>] (1-based)
    #[arg(long)]
    pub at: String,

    /// Severity (low, medium, high, critical)
    #[arg(short, long, default_value = "medium")]
    pub severity: String,

    /// Known fix, if any
    #[arg(long)]
    pub solution: Option<String>,
}

#[derive(Args, Debug)]
pub struct NoteArgs {
    /// What is wrong
    pub description: String,

    /// Severity (low, medium, high, critical)
    #[arg(short, long, default_value = "medium")]
    pub severity: String,

    /// Known fix, if any
    #[arg(long)]
    pub solution: Option<String>,
}

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Bug ID
    pub id: String,

    /// Solution text
    #[arg(required_unless_present = "clear")]
    pub text: Option<String>,

    /// Remove the solution instead
    #[arg(long, conflicts_with = "text")]
    pub clear: bool,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only bugs in this file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Filter by status
    #[arg(long)]
    pub status: Option<String>,

    /// Filter by severity
    #[arg(short, long)]
    pub severity: Option<String>,

    /// Only standalone bugs
    #[arg(long, conflicts_with = "file")]
    pub standalone: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::parse_from(["bt", "add", "off by one", "--at", "a.py:10:2", "-s", "high"]);
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.description, "off by one");
                assert_eq!(args.at, "a.py:10:2");
                assert_eq!(args.severity, "high");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_solve_requires_text_or_clear() {
        assert!(Cli::try_parse_from(["bt", "solve", "bug_1"]).is_err());
        assert!(Cli::try_parse_from(["bt", "solve", "bug_1", "--clear"]).is_ok());
        assert!(Cli::try_parse_from(["bt", "solve", "bug_1", "fixed it"]).is_ok());
    }
}
