pub mod error;
pub mod health;
pub mod log_record;

pub use error::{CoreError, CoreErrorKind, CoreResult};
pub use health::HealthStatus;
pub use log_record::{LogId, LogRecord, LogType, NewLogRecord};
