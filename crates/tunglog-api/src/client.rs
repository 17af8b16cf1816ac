//! Blocking HTTP client for pulling log entries from (and pushing them to)
//! a log API such as the demo server.

use std::io;
use std::time::Duration;

use serde_json::Value;
use tunglog_core::Outcome;
use tunglog_core::models::LogType;

use crate::error::{ApiError, ApiResult};
use crate::model::ApiLog;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// GET `endpoint` and return its log entries as raw JSON values. Accepts a
/// bare array or an object wrapping the array under `data`.
pub fn fetch_logs(endpoint: &str, timeout: Duration) -> ApiResult<Outcome<Vec<Value>>> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ApiError::EmptyEndpoint);
    }

    let response = agent(timeout).get(endpoint).call().map_err(request_error)?;
    let body = response.into_string().map_err(read_error)?;
    let entries = unwrap_entries(&body)?;

    let message = format!("Fetched {} logs from API.", entries.len());
    tracing::info!(endpoint, count = entries.len(), "fetched logs from API");
    Ok(Outcome::new(message, entries))
}

/// POST `logs` to `endpoint`; returns how many entries the server accepted.
pub fn post_logs(endpoint: &str, logs: &[ApiLog], timeout: Duration) -> ApiResult<usize> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ApiError::EmptyEndpoint);
    }

    let payload =
        serde_json::to_string(logs).map_err(|error| ApiError::Unexpected(error.to_string()))?;
    let response = agent(timeout)
        .post(endpoint)
        .set("Content-Type", "application/json")
        .send_string(&payload)
        .map_err(request_error)?;
    let body = response.into_string().map_err(read_error)?;
    let value: Value = serde_json::from_str(&body).map_err(|_| ApiError::InvalidJson)?;

    value
        .get("inserted")
        .and_then(Value::as_u64)
        .and_then(|count| usize::try_from(count).ok())
        .ok_or_else(|| ApiError::Unexpected("response has no 'inserted' count".to_string()))
}

/// Keep the entries that can become log records: a known type (matched
/// case-insensitively, `INFO` when absent) and a non-empty message.
pub fn importable_items(entries: &[Value]) -> Vec<(LogType, String)> {
    entries
        .iter()
        .filter_map(|entry| {
            let object = entry.as_object()?;
            let log_type = match object.get("log_type") {
                None | Some(Value::Null) => LogType::Info,
                Some(Value::String(raw)) => raw.to_uppercase().parse().ok()?,
                Some(_) => return None,
            };
            let message = match object.get("log_message") {
                Some(Value::String(text)) => text.clone(),
                None | Some(Value::Null) => String::new(),
                Some(other) => other.to_string(),
            };
            (!message.is_empty()).then_some((log_type, message))
        })
        .collect()
}

fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

fn unwrap_entries(body: &str) -> ApiResult<Vec<Value>> {
    let mut value: Value = serde_json::from_str(body).map_err(|_| ApiError::InvalidJson)?;
    if let Some(data) = value.as_object_mut().and_then(|object| object.remove("data")) {
        value = data;
    }
    match value {
        Value::Array(entries) => Ok(entries),
        _ => Err(ApiError::NotAList),
    }
}

fn request_error(error: ureq::Error) -> ApiError {
    match error {
        ureq::Error::Status(status, _) => ApiError::Http { status },
        ureq::Error::Transport(transport) => {
            let timed_out = std::error::Error::source(&transport)
                .and_then(|source| source.downcast_ref::<io::Error>())
                .is_some_and(|io_error| {
                    matches!(
                        io_error.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                    )
                });
            if timed_out {
                return ApiError::Timeout;
            }
            match transport.kind() {
                ureq::ErrorKind::Dns
                | ureq::ErrorKind::ConnectionFailed
                | ureq::ErrorKind::Io
                | ureq::ErrorKind::ProxyConnect => ApiError::Connection(transport.to_string()),
                _ => ApiError::Unexpected(transport.to_string()),
            }
        }
    }
}

fn read_error(error: io::Error) -> ApiError {
    match error.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ApiError::Timeout,
        _ => ApiError::Connection(error.to_string()),
    }
}
