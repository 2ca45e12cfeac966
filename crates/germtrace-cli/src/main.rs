//! # germtrace CLI entry point
//!
//! Parses command-line arguments, loads configuration, initializes logging,
//! and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use germtrace_cli::config::{CliConfig, LogFormat};
use germtrace_cli::invoke::{run_invoke, InvokeArgs};
use germtrace_cli::query::{
    run_audit, run_fields, run_history, run_range, run_read, AuditArgs, FieldsArgs, HistoryArgs,
    RangeArgs, ReadArgs,
};

/// Germplasm traceability ledger CLI.
///
/// Drives specimen records through collection, preservation, certification,
/// sharing and commit, and reads back their state and version history.
#[derive(Parser, Debug)]
#[command(name = "germtrace", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger file; overrides `ledger_path` from the configuration.
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a lifecycle operation as one ledger transaction.
    Invoke(InvokeArgs),

    /// Print the current snapshot of a record.
    Read(ReadArgs),

    /// Print every live record in an id range.
    Range(RangeArgs),

    /// Print every version of a record, oldest first.
    History(HistoryArgs),

    /// Recompute stage content hashes and report mismatches.
    Audit(AuditArgs),

    /// Print the positional field order of a stage payload.
    Fields(FieldsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(1);
        }
    };

    init_tracing(&config, cli.verbose);
    tracing::debug!("germtrace CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let ledger_path = cli.ledger.unwrap_or_else(|| config.ledger_path.clone());
    tracing::debug!(ledger = %ledger_path.display(), "resolved ledger path");

    let result = match cli.command {
        Commands::Invoke(args) => run_invoke(&args, &ledger_path),
        Commands::Read(args) => run_read(&args, &ledger_path),
        Commands::Range(args) => run_range(&args, &ledger_path),
        Commands::History(args) => run_history(&args, &ledger_path),
        Commands::Audit(args) => run_audit(&args, &ledger_path),
        Commands::Fields(args) => run_fields(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// Install the stderr subscriber. An invalid `log_level` falls back to `warn`.
fn init_tracing(config: &CliConfig, verbose: u8) {
    let filter = EnvFilter::try_new(config.filter_directive(verbose))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
