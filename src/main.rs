//! bt CLI entry point.

use bt::cli::commands;
use bt::cli::{Cli, Commands, OutputFormat};
use bt::config::resolve_paths;
use bt::error::Error;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.silent {
        bt::SILENT.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.dry_run {
        bt::DRY_RUN.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.format == OutputFormat::Csv {
        bt::CSV_OUTPUT.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR --format json OR non-TTY stdout
    let json = cli.json
        || cli.format == OutputFormat::Json
        || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    // Commands that never touch the store
    match &cli.command {
        Commands::Version => return commands::version::execute(json),
        Commands::Completions { shell } => return commands::completions::execute(shell),
        _ => {}
    }

    let mut paths = resolve_paths(
        cli.store.as_deref(),
        cli.report.as_deref(),
        cli.workspace.as_deref(),
    )?;
    if cli.no_report {
        paths.report = None;
    }

    match &cli.command {
        Commands::Add(args) => commands::bug::add(args, &paths, json),
        Commands::Note(args) => commands::bug::note(args, &paths, json),
        Commands::Remove { ids } => commands::bug::remove(ids, &paths, json),
        Commands::SetStatus { id, status } => commands::bug::set_status(id, status, &paths, json),
        Commands::Solve(args) => commands::bug::solve(args, &paths, json),
        Commands::List(args) => commands::bug::list(args, &paths, json),
        Commands::Show { id } => commands::bug::show(id, &paths, json),
        Commands::Marks { file } => commands::bug::marks(file, &paths, json),

        // Report
        Commands::Export { output } => commands::sync::export(output.as_deref(), &paths, json),
        Commands::Import { input } => commands::sync::import(input.as_deref(), &paths, json),
        Commands::Summary => commands::sync::summary(&paths, json),

        Commands::Version | Commands::Completions { .. } => Ok(()),
    }
}
