use std::path::Path;

use super::write_error;
use crate::models::{CoreResult, LogRecord};

/// Header comes from the record's field names.
pub(super) fn write(records: &[LogRecord], path: &Path) -> CoreResult<()> {
    let mut writer = ::csv::Writer::from_path(path).map_err(|error| write_error(path, error))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|error| write_error(path, error))?;
    }
    writer.flush().map_err(|error| write_error(path, error))
}
