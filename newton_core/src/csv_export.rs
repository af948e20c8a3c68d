//! CSV export of analytics logs for spreadsheets.

use crate::{AnalyticsLog, Result};
use std::io::Write;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    name: &'a str,
    value: f64,
    unit: Option<&'a str>,
    timestamp: String,
    cumulative: bool,
    daily_goal: Option<f64>,
}

impl<'a> From<&'a AnalyticsLog> for CsvRow<'a> {
    fn from(log: &'a AnalyticsLog) -> Self {
        CsvRow {
            name: &log.name,
            value: log.value,
            unit: log.unit.as_deref(),
            timestamp: log.timestamp.to_rfc3339(),
            cumulative: log.is_cumulative(),
            daily_goal: log.daily_goal,
        }
    }
}

/// Write `logs` as CSV (with a header row) to any writer
pub fn write_logs<W: Write>(writer: W, logs: &[&AnalyticsLog]) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);
    for log in logs {
        writer.serialize(CsvRow::from(*log))?;
    }
    writer.flush()?;
    Ok(logs.len())
}

/// Write `logs` to `path`, replacing any existing file
///
/// The file is written to a temporary sibling, fsynced, then renamed into
/// place so a partial export never replaces a good one.
pub fn export_logs(path: &Path, logs: &[&AnalyticsLog]) -> Result<usize> {
    let parent = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    let count = write_logs(temp.as_file_mut(), logs)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    tracing::info!("Wrote {} log entries to {:?}", count, path);
    Ok(count)
}
