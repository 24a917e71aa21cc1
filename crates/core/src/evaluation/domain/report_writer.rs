use std::path::{Path, PathBuf};

use thiserror::Error;

use super::evaluation_record::EvaluationRecord;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Domain interface for persisting evaluation results.
pub trait ReportWriter: Send {
    fn write_report(&self, path: &Path, records: &[EvaluationRecord]) -> Result<(), ReportError>;
}
