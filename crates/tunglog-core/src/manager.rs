//! In-memory working set of log records kept in step with a [`LogStore`].
//!
//! Every public operation reports failure as an `Err` carrying a
//! human-readable message; nothing below this layer escapes any other way.

use std::collections::HashSet;
use std::sync::Arc;

use crate::clock;
use crate::models::{
    CoreError, CoreErrorKind, CoreResult, HealthStatus, LogRecord, LogType, NewLogRecord,
};
use crate::persistence::LogStore;

pub const DEFAULT_REFRESH_LIMIT: usize = 500;

/// A successful manager operation: what to tell the user, and the result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Outcome<T> {
    pub message: String,
    pub value: T,
}

impl<T> Outcome<T> {
    pub fn new(message: impl Into<String>, value: T) -> Self {
        Self {
            message: message.into(),
            value,
        }
    }
}

pub type ManagerResult<T> = Result<Outcome<T>, CoreError>;

pub struct LogManager {
    store: Arc<dyn LogStore>,
    hostname: String,
    /// Newest first. Replaced wholesale on refresh, prepended on single add.
    logs: Vec<LogRecord>,
}

impl LogManager {
    /// Initialize the store schema and attach a manager stamping records
    /// with this machine's host name.
    pub fn open(store: Arc<dyn LogStore>) -> CoreResult<Self> {
        store.initialize_schema()?;
        Ok(Self::with_hostname(store, clock::hostname()))
    }

    pub fn with_hostname(store: Arc<dyn LogStore>, hostname: impl Into<String>) -> Self {
        Self {
            store,
            hostname: hostname.into(),
            logs: Vec::new(),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.logs
    }

    pub fn add_log(&mut self, log_message: &str, log_type: &str) -> ManagerResult<LogRecord> {
        let inserted = log_type.parse::<LogType>().and_then(|log_type| {
            self.store.insert_one(&NewLogRecord::new(
                log_type,
                log_message,
                &self.hostname,
                clock::utc_now(),
            ))
        });

        let record = match inserted {
            Ok(record) => record,
            Err(error) => return Err(report(error, "Failed to add log")),
        };
        let Some(id) = record.id else {
            return Err(report(
                CoreError::new(CoreErrorKind::Internal, "Insert returned no row"),
                "Failed to add log",
            ));
        };

        let message = format!("Saved log #{id} ({})!", record.log_type);
        tracing::info!("{message}");
        self.logs.insert(0, record.clone());
        Ok(Outcome::new(message, record))
    }

    /// Validate every item, then insert them in one batch. The cache is left
    /// untouched; callers refresh to see the new rows.
    pub fn add_logs_bulk<T, M>(&self, items: &[(T, M)]) -> ManagerResult<usize>
    where
        T: AsRef<str>,
        M: AsRef<str>,
    {
        let inserted = items
            .iter()
            .map(|(log_type, log_message)| -> CoreResult<NewLogRecord> {
                Ok(NewLogRecord::new(
                    log_type.as_ref().parse()?,
                    log_message.as_ref(),
                    &self.hostname,
                    clock::utc_now(),
                ))
            })
            .collect::<CoreResult<Vec<_>>>()
            .and_then(|rows| self.store.insert_many(&rows));

        match inserted {
            Ok(count) => {
                let message = format!("Inserted {count} logs!");
                tracing::info!(count, "{message}");
                Ok(Outcome::new(message, count))
            }
            Err(error) => Err(report(error, "Bulk insert failed")),
        }
    }

    /// Replace the cache with up to `limit` rows from the store, newest first.
    /// An empty or absent filter fetches every type.
    pub fn refresh_from_db<S: AsRef<str>>(
        &mut self,
        filter_types: Option<&[S]>,
        limit: usize,
    ) -> ManagerResult<Vec<LogRecord>> {
        let fetched = filter_types
            .map(LogType::parse_all)
            .transpose()
            .and_then(|types| self.store.fetch(types.as_deref(), limit));

        match fetched {
            Ok(records) => {
                self.logs = records;
                let message = format!("Fetched {} logs from DB!", self.logs.len());
                tracing::info!("{message}");
                Ok(Outcome::new(message, self.logs.clone()))
            }
            Err(error) => Err(report(error, "Failed to refresh logs")),
        }
    }

    /// Cached records whose type is in `types`, in cache order. No I/O.
    pub fn filter_local(&self, types: &[LogType]) -> Vec<LogRecord> {
        let wanted: HashSet<LogType> = types.iter().copied().collect();
        self.logs
            .iter()
            .filter(|record| wanted.contains(&record.log_type))
            .cloned()
            .collect()
    }

    pub fn reset_logs(&mut self) -> ManagerResult<()> {
        match self.store.reset() {
            Ok(()) => {
                self.logs.clear();
                let message = "Log table and ID counter successfully reset!";
                tracing::info!("{message}");
                Ok(Outcome::new(message, ()))
            }
            Err(error) => Err(report(error, "Failed to reset log table")),
        }
    }

    pub fn health_check(&self) -> HealthStatus {
        self.store.health_check()
    }
}

fn report(error: CoreError, context: &str) -> CoreError {
    let error = error.context(context);
    tracing::error!(kind = ?error.kind, "{error}");
    error
}
