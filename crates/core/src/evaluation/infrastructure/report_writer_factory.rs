use std::path::Path;

use crate::evaluation::domain::report_writer::ReportWriter;
use crate::evaluation::infrastructure::csv_report_writer::CsvReportWriter;
use crate::evaluation::infrastructure::json_report_writer::JsonReportWriter;

/// Pick a report format from the destination's extension. Defaults to CSV.
pub fn create_report_writer(path: &Path) -> Box<dyn ReportWriter> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        Box::new(JsonReportWriter)
    } else {
        Box::new(CsvReportWriter)
    }
}
