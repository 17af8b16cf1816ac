use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::write_error;
use crate::models::{CoreResult, LogRecord};

pub(super) fn write(records: &[LogRecord], path: &Path) -> CoreResult<()> {
    let file = File::create(path).map_err(|error| write_error(path, error))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records).map_err(|error| write_error(path, error))?;
    writer.flush().map_err(|error| write_error(path, error))
}
