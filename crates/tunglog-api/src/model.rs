use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tunglog_core::models::LogRecord;

/// Wire shape of a log entry. Loosely typed on purpose: the demo server
/// stores whatever clients post, and importers validate on the way in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiLog {
    pub log_type: String,
    pub log_message: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ApiLog {
    pub fn new(log_type: impl Into<String>, log_message: impl Into<String>) -> Self {
        Self {
            log_type: log_type.into(),
            log_message: log_message.into(),
            hostname: None,
            created_at: None,
        }
    }
}

impl From<&LogRecord> for ApiLog {
    fn from(record: &LogRecord) -> Self {
        Self {
            log_type: record.log_type.as_str().to_string(),
            log_message: record.log_message.clone(),
            hostname: Some(record.hostname.clone()),
            created_at: Some(record.created_at),
        }
    }
}
