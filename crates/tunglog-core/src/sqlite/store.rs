use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, params, params_from_iter};

use crate::config::StoreConfig;
use crate::models::{
    CoreError, CoreErrorKind, HealthStatus, LogId, LogRecord, LogType, NewLogRecord,
};
use crate::persistence::{LogStore, PersistenceResult};
use crate::retry::RetryPolicy;
use crate::sqlite::schema::{LOG_COLUMNS, LOG_SCHEMA_SQL, LOG_TABLE};

/// Rows per multi-row INSERT; four parameters each keeps a statement well
/// under SQLite's bound-parameter limit.
const BULK_INSERT_CHUNK_ROWS: usize = 200;
const HEALTH_CHECK_ATTEMPTS: u32 = 2;

pub struct SqliteLogStore {
    database_path: PathBuf,
    pool: Pool<SqliteConnectionManager>,
    retry: RetryPolicy,
    pending_faults: AtomicU32,
}

impl SqliteLogStore {
    pub fn open(config: &StoreConfig) -> PersistenceResult<Self> {
        config.validate()?;
        ensure_parent_dir(&config.database_path)?;

        let busy_timeout = config.connect_timeout;
        let manager = SqliteConnectionManager::file(&config.database_path)
            .with_init(move |connection| connection.busy_timeout(busy_timeout));
        let pool = Pool::builder()
            .min_idle(Some(config.pool_min))
            .max_size(config.pool_max)
            .connection_timeout(config.connect_timeout)
            .build(manager)
            .map_err(|error| pool_error("open", error))?;

        tracing::info!(
            path = %config.database_path.display(),
            pool_min = config.pool_min,
            pool_max = config.pool_max,
            "database connection pool initialized"
        );

        Ok(Self {
            database_path: config.database_path.clone(),
            pool,
            retry: RetryPolicy::new(config.retry_attempts, config.retry_base_delay),
            pending_faults: AtomicU32::new(0),
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Open connections and how many of them are idle in the pool.
    pub fn pool_usage(&self) -> (u32, u32) {
        let state = self.pool.state();
        (state.connections, state.idle_connections)
    }

    /// Make the next `count` connection checkouts fail with a transient error.
    pub fn inject_transient_faults(&self, count: u32) {
        self.pending_faults.store(count, Ordering::SeqCst);
    }

    pub fn pending_transient_faults(&self) -> u32 {
        self.pending_faults.load(Ordering::SeqCst)
    }

    /// Release every pooled connection.
    pub fn close(self) {
        let (connections, _) = self.pool_usage();
        tracing::info!(connections, "closing database connection pool");
        drop(self.pool);
    }

    fn with_connection<T>(
        &self,
        operation_name: &'static str,
        mut operation: impl FnMut(&mut Connection) -> rusqlite::Result<T>,
    ) -> PersistenceResult<T> {
        self.with_connection_retrying(self.retry, operation_name, &mut operation)
    }

    fn with_connection_retrying<T>(
        &self,
        policy: RetryPolicy,
        operation_name: &'static str,
        operation: &mut impl FnMut(&mut Connection) -> rusqlite::Result<T>,
    ) -> PersistenceResult<T> {
        policy.run(operation_name, || {
            let mut connection = self.checkout(operation_name)?;
            operation(&mut *connection).map_err(|error| storage_error(operation_name, error))
        })
    }

    fn checkout(
        &self,
        operation_name: &'static str,
    ) -> PersistenceResult<PooledConnection<SqliteConnectionManager>> {
        if self.take_fault() {
            return Err(transient_error(
                operation_name,
                "injected transient connection failure",
            ));
        }
        self.pool
            .get()
            .map_err(|error| pool_error(operation_name, error))
    }

    fn take_fault(&self) -> bool {
        self.pending_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |pending| {
                pending.checked_sub(1)
            })
            .is_ok()
    }
}

impl LogStore for SqliteLogStore {
    fn initialize_schema(&self) -> PersistenceResult<()> {
        self.with_connection("initialize_schema", |connection| {
            connection.execute_batch(LOG_SCHEMA_SQL)
        })?;
        tracing::debug!(table = LOG_TABLE, "log schema ready");
        Ok(())
    }

    fn insert_one(&self, record: &NewLogRecord) -> PersistenceResult<LogRecord> {
        let created_at = to_sqlite_timestamp(record.created_at);
        self.with_connection("insert_one", |connection| {
            connection.query_row(
                &format!(
                    "
INSERT INTO logs (log_type, log_message, hostname, created_at)
VALUES (?1, ?2, ?3, ?4)
RETURNING {LOG_COLUMNS}
"
                ),
                params![
                    record.log_type.as_str(),
                    record.log_message.as_str(),
                    record.hostname.as_str(),
                    created_at.as_str(),
                ],
                map_log_row,
            )
        })
    }

    fn insert_many(&self, records: &[NewLogRecord]) -> PersistenceResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        self.with_connection("insert_many", |connection| {
            let transaction = connection.transaction()?;
            let mut inserted = 0;
            for chunk in records.chunks(BULK_INSERT_CHUNK_ROWS) {
                let placeholders = vec!["(?, ?, ?, ?)"; chunk.len()].join(", ");
                let values = chunk.iter().flat_map(|record| {
                    [
                        Value::from(record.log_type.as_str().to_string()),
                        Value::from(record.log_message.clone()),
                        Value::from(record.hostname.clone()),
                        Value::from(to_sqlite_timestamp(record.created_at)),
                    ]
                });
                inserted += transaction.execute(
                    &format!(
                        "INSERT INTO logs (log_type, log_message, hostname, created_at) VALUES {placeholders}"
                    ),
                    params_from_iter(values),
                )?;
            }
            transaction.commit()?;
            Ok(inserted)
        })
    }

    fn fetch(&self, types: Option<&[LogType]>, limit: usize) -> PersistenceResult<Vec<LogRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let types = types.filter(|types| !types.is_empty());

        self.with_connection("fetch", |connection| {
            let mut values: Vec<Value> = Vec::new();
            let filter = match types {
                Some(types) => {
                    values.extend(
                        types
                            .iter()
                            .map(|log_type| Value::from(log_type.as_str().to_string())),
                    );
                    format!("WHERE log_type IN ({})", vec!["?"; types.len()].join(", "))
                }
                None => String::new(),
            };
            values.push(Value::from(to_i64(limit)?));

            let mut statement = connection.prepare(&format!(
                "
SELECT {LOG_COLUMNS}
FROM logs
{filter}
ORDER BY created_at DESC, id DESC
LIMIT ?
"
            ))?;
            let rows = statement.query_map(params_from_iter(values), map_log_row)?;
            rows.collect()
        })
    }

    fn health_check(&self) -> HealthStatus {
        let policy = self.retry.capped(HEALTH_CHECK_ATTEMPTS);
        let result = self.with_connection_retrying(
            policy,
            "health_check",
            &mut |connection: &mut Connection| {
                connection.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            },
        );

        match result {
            Ok(_) => HealthStatus::healthy("Database connection is perfectly healthy!"),
            Err(error) => HealthStatus::unhealthy(format!("Database connection failed: {error}")),
        }
    }

    fn reset(&self) -> PersistenceResult<()> {
        self.with_connection("reset", |connection| {
            let transaction = connection.transaction()?;
            transaction.execute("DELETE FROM logs", [])?;
            transaction.execute("DELETE FROM sqlite_sequence WHERE name = ?1", [LOG_TABLE])?;
            transaction.commit()
        })?;
        tracing::info!("log table reset and id counter restarted");
        Ok(())
    }
}

fn ensure_parent_dir(database_path: &Path) -> PersistenceResult<()> {
    if let Some(parent) = database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|error| {
            CoreError::new(
                CoreErrorKind::StorageFailure,
                format!(
                    "failed to create database directory '{}': {error}",
                    parent.display()
                ),
            )
            .with_operation("open")
        })?;
    }
    Ok(())
}

fn map_log_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogRecord> {
    let id_raw: i64 = row.get(0)?;
    let log_type_raw: String = row.get(1)?;
    let log_message: String = row.get(2)?;
    let hostname: String = row.get(3)?;
    let created_at_raw: String = row.get(4)?;

    Ok(LogRecord {
        id: Some(LogId(i64_to_u64(id_raw)?)),
        log_type: parse_log_type(&log_type_raw)?,
        log_message,
        hostname,
        created_at: from_sqlite_timestamp(&created_at_raw)?,
    })
}

fn parse_log_type(raw: &str) -> rusqlite::Result<LogType> {
    raw.parse::<LogType>().map_err(|_| {
        storage_error_sqlite(&format!("unknown log type '{raw}' in sqlite record"))
    })
}

/// Fixed-width RFC 3339 in UTC, so lexical order in SQL equals time order.
fn to_sqlite_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn from_sqlite_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| {
            storage_error_sqlite(&format!("invalid created_at '{raw}' in sqlite record: {error}"))
        })
}

fn is_transient(error: &rusqlite::Error) -> bool {
    matches!(
        error.sqlite_error_code(),
        Some(
            ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::FileLockingProtocolFailed
        )
    )
}

fn storage_error(operation: &'static str, error: rusqlite::Error) -> CoreError {
    let kind = if is_transient(&error) {
        CoreErrorKind::Transient
    } else {
        CoreErrorKind::StorageFailure
    };
    CoreError::new(kind, format!("sqlite store '{operation}' failed: {error}"))
        .with_operation(operation)
}

fn pool_error(operation: &'static str, error: r2d2::Error) -> CoreError {
    transient_error(operation, format!("connection pool unavailable: {error}"))
}

fn transient_error(operation: &'static str, message: impl AsRef<str>) -> CoreError {
    CoreError::new(
        CoreErrorKind::Transient,
        format!("sqlite store '{operation}' failed: {}", message.as_ref()),
    )
    .with_operation(operation)
}

fn storage_error_sqlite(message: &str) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::other(message.to_string())))
}

fn i64_to_u64(value: i64) -> rusqlite::Result<u64> {
    u64::try_from(value).map_err(|_| storage_error_sqlite("negative log id in sqlite record"))
}

fn to_i64(value: usize) -> rusqlite::Result<i64> {
    i64::try_from(value).map_err(|_| storage_error_sqlite("value exceeds i64 range"))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{from_sqlite_timestamp, to_sqlite_timestamp};

    #[test]
    fn timestamps_are_fixed_width_utc_text() {
        let whole_second = Utc.with_ymd_and_hms(2025, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(to_sqlite_timestamp(whole_second), "2025-03-09T07:05:01.000Z");

        let parsed = from_sqlite_timestamp("2025-03-09T07:05:01.250Z").unwrap();
        assert_eq!(to_sqlite_timestamp(parsed), "2025-03-09T07:05:01.250Z");
    }

    #[test]
    fn non_utc_offsets_are_normalized() {
        let parsed = from_sqlite_timestamp("2025-03-09T09:05:01.000+02:00").unwrap();
        assert_eq!(to_sqlite_timestamp(parsed), "2025-03-09T07:05:01.000Z");
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        assert!(from_sqlite_timestamp("yesterday").is_err());
    }
}
