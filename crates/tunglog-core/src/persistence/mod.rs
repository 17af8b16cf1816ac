use crate::models::{CoreResult, HealthStatus, LogRecord, LogType, NewLogRecord};

pub type PersistenceResult<T> = CoreResult<T>;

pub trait LogStore: Send + Sync {
    /// Idempotently create the log table and its indexes.
    fn initialize_schema(&self) -> PersistenceResult<()>;

    fn insert_one(&self, record: &NewLogRecord) -> PersistenceResult<LogRecord>;

    /// Insert every row or none; an empty slice performs no I/O.
    fn insert_many(&self, records: &[NewLogRecord]) -> PersistenceResult<usize>;

    /// Up to `limit` rows, newest `created_at` first, optionally restricted to `types`.
    fn fetch(&self, types: Option<&[LogType]>, limit: usize) -> PersistenceResult<Vec<LogRecord>>;

    /// Never fails; store problems are reported through the status.
    fn health_check(&self) -> HealthStatus;

    /// Delete every row and restart id assignment at 1.
    fn reset(&self) -> PersistenceResult<()>;
}
