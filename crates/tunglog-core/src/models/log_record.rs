use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::CoreError;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogType {
    Info,
    Warning,
    Error,
    Debug,
}

impl LogType {
    pub const ALL: [LogType; 4] = [Self::Info, Self::Warning, Self::Error, Self::Debug];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Debug => "DEBUG",
        }
    }

    /// Parse a list of raw type names, failing on the first unknown one.
    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<LogType>, CoreError> {
        raw.iter().map(|value| value.as_ref().parse()).collect()
    }
}

impl Display for LogType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogType {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "INFO" => Ok(Self::Info),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "DEBUG" => Ok(Self::Debug),
            _ => {
                let allowed: Vec<&str> = Self::ALL.iter().map(|kind| kind.as_str()).collect();
                Err(CoreError::invalid_input(format!(
                    "Invalid log_type '{value}'. Allowed: {}",
                    allowed.join(", ")
                )))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(pub u64);

impl Display for LogId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Assigned by the store; `None` only before the record is persisted.
    pub id: Option<LogId>,
    pub log_type: LogType,
    pub log_message: String,
    pub hostname: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NewLogRecord {
    pub log_type: LogType,
    pub log_message: String,
    pub hostname: String,
    pub created_at: DateTime<Utc>,
}

impl NewLogRecord {
    pub fn new(
        log_type: LogType,
        log_message: impl Into<String>,
        hostname: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            log_type,
            log_message: log_message.into(),
            hostname: hostname.into(),
            created_at,
        }
    }
}
