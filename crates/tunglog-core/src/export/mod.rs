//! Serialize log records to files: JSON, CSV, PDF and DOCX.

mod csv;
mod docx;
mod json;
mod pdf;

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use crate::models::{CoreError, CoreResult, LogRecord};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ExportFormat {
    Json,
    Csv,
    Pdf,
    Docx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Json, Self::Csv, Self::Pdf, Self::Docx];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => Err(CoreError::invalid_input(format!(
                "unsupported export format '{value}' (expected json, csv, pdf or docx)"
            ))),
        }
    }
}

/// Write `records` to `path` in `format`, creating parent directories.
pub fn export(records: &[LogRecord], format: ExportFormat, path: &Path) -> CoreResult<()> {
    if format == ExportFormat::Csv && records.is_empty() {
        return Err(CoreError::export("No logs to export!"));
    }
    ensure_parent(path)?;

    match format {
        ExportFormat::Json => json::write(records, path),
        ExportFormat::Csv => csv::write(records, path),
        ExportFormat::Pdf => pdf::write(records, path),
        ExportFormat::Docx => docx::write(records, path),
    }?;

    tracing::info!(
        count = records.len(),
        format = %format,
        path = %path.display(),
        "exported logs"
    );
    Ok(())
}

fn ensure_parent(path: &Path) -> CoreResult<()> {
    match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent).map_err(|error| write_error(parent, error)),
        None => Ok(()),
    }
}

fn write_error(path: &Path, error: impl Display) -> CoreError {
    CoreError::export(format!("failed to write '{}': {error}", path.display()))
}

/// One human-readable line per record, shared by the PDF writer.
fn summary_line(record: &LogRecord) -> String {
    let id = record
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{id} | {} | {} | {} | {}",
        record.log_type,
        record.log_message,
        record.hostname,
        record.created_at.to_rfc3339()
    )
}
