use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tunglog_api::client;
use tunglog_core::export::{self, ExportFormat};
use tunglog_core::models::LogRecord;
use tunglog_core::sqlite::SqliteLogStore;
use tunglog_core::{DEFAULT_REFRESH_LIMIT, LogManager, StoreConfig};

use crate::Command;
use crate::error::{CliError, CliResult};

pub fn run(db: Option<PathBuf>, command: Command) -> CliResult<ExitCode> {
    match command {
        Command::Init => {
            open_manager(db)?;
            println!("Log table ready.");
        }
        Command::Add { message, log_type } => {
            if message.trim().is_empty() {
                return Err(CliError::refused("Log message cannot be empty!"));
            }
            let saved = open_manager(db)?.add_log(&message, &log_type)?;
            println!("{}", saved.message);
            print_table(std::slice::from_ref(&saved.value));
        }
        Command::List {
            types,
            only,
            limit,
        } => {
            let mut manager = open_manager(db)?;
            let fetched = manager.refresh_from_db(type_filter(&types), limit)?;
            eprintln!("{}", fetched.message);
            if only.is_empty() {
                print_table(manager.records());
            } else {
                print_table(&manager.filter_local(&only));
            }
        }
        Command::Export {
            format,
            path,
            types,
            limit,
        } => export_logs(&mut open_manager(db)?, format, &path, &types, limit)?,
        Command::ImportApi {
            endpoint,
            timeout_secs,
        } => import_api(
            &mut open_manager(db)?,
            &endpoint,
            Duration::from_secs(timeout_secs),
        )?,
        Command::Reset { yes } => {
            if !yes {
                return Err(CliError::refused(
                    "Refusing to reset without --yes; this deletes every log.",
                ));
            }
            println!("{}", open_manager(db)?.reset_logs()?.message);
        }
        Command::Health => {
            let status = open_manager(db)?.health_check();
            println!("{}", status.message);
            if !status.healthy {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Serve { addr } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(tunglog_api::server::serve(addr))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn open_manager(db: Option<PathBuf>) -> CliResult<LogManager> {
    let mut config = StoreConfig::from_env()?;
    if let Some(path) = db {
        config.database_path = path;
    }
    let store = SqliteLogStore::open(&config)?;
    Ok(LogManager::open(Arc::new(store))?)
}

fn type_filter(types: &[String]) -> Option<&[String]> {
    (!types.is_empty()).then_some(types)
}

fn export_logs(
    manager: &mut LogManager,
    format: ExportFormat,
    path: &Path,
    types: &[String],
    limit: usize,
) -> CliResult<()> {
    manager.refresh_from_db(type_filter(types), limit)?;
    if manager.records().is_empty() {
        return Err(CliError::refused("There are no logs to export!"));
    }
    export::export(manager.records(), format, path)?;
    println!(
        "Exported {} logs as {format} to {}",
        manager.records().len(),
        path.display()
    );
    Ok(())
}

fn import_api(manager: &mut LogManager, endpoint: &str, timeout: Duration) -> CliResult<()> {
    let fetched = client::fetch_logs(endpoint, timeout)?;
    eprintln!("{}", fetched.message);

    let items: Vec<(&'static str, String)> = client::importable_items(&fetched.value)
        .into_iter()
        .map(|(log_type, message)| (log_type.as_str(), message))
        .collect();
    if items.is_empty() {
        return Err(CliError::refused("Fetched data did not contain valid logs!"));
    }

    let inserted = manager.add_logs_bulk(&items)?;
    println!("{}", inserted.message);
    let refreshed = manager.refresh_from_db(None::<&[&str]>, DEFAULT_REFRESH_LIMIT)?;
    eprintln!("{}", refreshed.message);
    Ok(())
}

fn print_table(records: &[LogRecord]) {
    if records.is_empty() {
        println!("(no logs)");
        return;
    }
    println!(
        "{:>6}  {:<19}  {:<7}  {:<16}  MESSAGE",
        "ID", "CREATED", "TYPE", "HOST"
    );
    for record in records {
        let id = record
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:<19}  {:<7}  {:<16}  {}",
            id,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.log_type.as_str(),
            record.hostname,
            record.log_message
        );
    }
}
