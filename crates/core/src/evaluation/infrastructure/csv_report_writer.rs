use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::evaluation::domain::evaluation_record::{EvaluationOutcome, EvaluationRecord};
use crate::evaluation::domain::report_writer::{ReportError, ReportWriter};

pub const CSV_HEADER: &str = "file_id,status,wer,eer,processing_time_seconds,error";

/// Writes one CSV row per record. Failed rows leave the score columns empty.
pub struct CsvReportWriter;

impl CsvReportWriter {
    pub fn render(records: &[EvaluationRecord]) -> String {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for record in records {
            let row = match &record.outcome {
                EvaluationOutcome::Scored {
                    wer,
                    eer,
                    processing_time_seconds,
                } => format!(
                    "{},scored,{wer:.6},{eer:.6},{processing_time_seconds:.6},",
                    escape(&record.file_id)
                ),
                EvaluationOutcome::Failed { kind, message } => format!(
                    "{},failed,,,,{}",
                    escape(&record.file_id),
                    escape(&format!("{kind}: {message}"))
                ),
            };
            out.push_str(&row);
            out.push('\n');
        }
        out
    }
}

impl ReportWriter for CsvReportWriter {
    fn write_report(&self, path: &Path, records: &[EvaluationRecord]) -> Result<(), ReportError> {
        let io_err = |source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        writer
            .write_all(Self::render(records).as_bytes())
            .map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        log::info!("Wrote {} records to {}", records.len(), path.display());
        Ok(())
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::domain::evaluation_record::FailureKind;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::plain("speaker1.wav", "speaker1.wav")]
    #[case::comma("a,b.wav", "\"a,b.wav\"")]
    #[case::quote("say \"hi\".wav", "\"say \"\"hi\"\".wav\"")]
    fn test_escape(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape(input), expected);
    }

    #[test]
    fn test_render_rows_in_order() {
        let records = vec![
            EvaluationRecord::failed("missing.wav", FailureKind::UnreadableAudio, "not found"),
            EvaluationRecord::scored("ok.wav", 0.25, 0.5, 1.5),
        ];
        let csv = CsvReportWriter::render(&records);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "missing.wav,failed,,,,unreadable_audio: not found");
        assert_eq!(lines[2], "ok.wav,scored,0.250000,0.500000,1.500000,");
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        let records = vec![EvaluationRecord::scored("a.wav", 0.0, 0.5, 0.1)];
        CsvReportWriter.write_report(&path, &records).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(CSV_HEADER));
        assert!(content.contains("a.wav,scored"));
    }

    #[test]
    fn test_write_report_into_missing_dir_fails() {
        let result = CsvReportWriter.write_report(Path::new("/nonexistent/dir/report.csv"), &[]);
        assert!(matches!(result, Err(ReportError::Io { .. })));
    }
}
