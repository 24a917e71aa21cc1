use std::fs;
use std::path::Path;

use crate::evaluation::domain::evaluation_record::EvaluationRecord;
use crate::evaluation::domain::report_writer::{ReportError, ReportWriter};

/// Writes the records as a pretty-printed JSON array.
pub struct JsonReportWriter;

impl ReportWriter for JsonReportWriter {
    fn write_report(&self, path: &Path, records: &[EvaluationRecord]) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(path, json).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Wrote {} records to {}", records.len(), path.display());
        Ok(())
    }
}
