//! `tunglog`: record, browse, export and import structured log entries.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tunglog_api::server::DEFAULT_ADDR;
use tunglog_core::DEFAULT_REFRESH_LIMIT;
use tunglog_core::export::ExportFormat;
use tunglog_core::models::LogType;

mod commands;
mod error;

/// Log manager backed by an embedded SQLite store
#[derive(Debug, Parser)]
#[command(name = "tunglog", version, about)]
struct Cli {
    /// SQLite database file; other store settings come from TUNGLOG_* variables
    #[arg(long, global = true, env = "TUNGLOG_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the log table and indexes if missing
    Init,

    /// Save one log entry stamped with this machine's host name
    Add {
        message: String,

        #[arg(short = 't', long = "type", default_value = "INFO")]
        log_type: String,
    },

    /// Fetch the newest entries and print them as a table
    List {
        /// Only fetch these types from the store (repeatable)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,

        /// Narrow the fetched entries further without another query (repeatable)
        #[arg(long, value_parser = parse_log_type)]
        only: Vec<LogType>,

        #[arg(short, long, default_value_t = DEFAULT_REFRESH_LIMIT)]
        limit: usize,
    },

    /// Fetch entries and write them to a file as json, csv, pdf or docx
    Export {
        format: ExportFormat,

        path: PathBuf,

        #[arg(short = 't', long = "type")]
        types: Vec<String>,

        #[arg(short, long, default_value_t = DEFAULT_REFRESH_LIMIT)]
        limit: usize,
    },

    /// Pull entries from a log API and store the valid ones
    ImportApi {
        endpoint: String,

        #[arg(long, default_value_t = 5)]
        timeout_secs: u64,
    },

    /// Delete every entry and restart ids at 1
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Check that the store answers queries
    Health,

    /// Run the demo log API until Ctrl+C
    Serve {
        #[arg(long, default_value = DEFAULT_ADDR)]
        addr: SocketAddr,
    },
}

fn parse_log_type(value: &str) -> Result<LogType, String> {
    value.parse().map_err(|error: tunglog_core::models::CoreError| error.to_string())
}

fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let serving = matches!(cli.command, Command::Serve { .. });
    init_tracing(if serving { "info" } else { "warn" });

    match commands::run(cli.db, cli.command) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
