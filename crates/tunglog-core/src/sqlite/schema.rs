pub const LOG_TABLE: &str = "logs";

/// DDL for the log table and its indexes. Every statement is `IF NOT EXISTS`,
/// so applying it to an initialized database is a no-op.
pub const LOG_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    log_type TEXT NOT NULL CHECK (length(log_type) <= 32),
    log_message TEXT NOT NULL,
    hostname TEXT NOT NULL CHECK (length(hostname) <= 255),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_logs_type ON logs (log_type);

CREATE INDEX IF NOT EXISTS idx_logs_created_at ON logs (created_at);
"#;

/// Columns in the order the row mapper expects them.
pub const LOG_COLUMNS: &str = "id, log_type, log_message, hostname, created_at";

pub const MAX_HOSTNAME_LEN: usize = 255;
