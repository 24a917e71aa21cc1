use serde::Serialize;

/// Why an item produced no scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnreadableAudio,
    InsufficientAudioLength,
    TranscriptionFailed,
    MetricFailed,
    WriteFailed,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UnreadableAudio => "unreadable_audio",
            FailureKind::InsufficientAudioLength => "insufficient_audio_length",
            FailureKind::TranscriptionFailed => "transcription_failed",
            FailureKind::MetricFailed => "metric_failed",
            FailureKind::WriteFailed => "write_failed",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Scored {
        wer: f64,
        eer: f64,
        processing_time_seconds: f64,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

/// One row of the evaluation report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRecord {
    pub file_id: String,
    #[serde(flatten)]
    pub outcome: EvaluationOutcome,
}

impl EvaluationRecord {
    pub fn scored(file_id: impl Into<String>, wer: f64, eer: f64, processing_time_seconds: f64) -> Self {
        Self {
            file_id: file_id.into(),
            outcome: EvaluationOutcome::Scored {
                wer,
                eer,
                processing_time_seconds: processing_time_seconds.max(0.0),
            },
        }
    }

    pub fn failed(file_id: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            outcome: EvaluationOutcome::Failed {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, EvaluationOutcome::Failed { .. })
    }

    pub fn wer(&self) -> Option<f64> {
        match self.outcome {
            EvaluationOutcome::Scored { wer, .. } => Some(wer),
            EvaluationOutcome::Failed { .. } => None,
        }
    }

    pub fn eer(&self) -> Option<f64> {
        match self.outcome {
            EvaluationOutcome::Scored { eer, .. } => Some(eer),
            EvaluationOutcome::Failed { .. } => None,
        }
    }
}

/// Aggregate over a batch of records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub failed: usize,
    pub mean_wer: Option<f64>,
    pub mean_eer: Option<f64>,
}

impl BatchSummary {
    pub fn from_records(records: &[EvaluationRecord]) -> Self {
        let mean = |values: Vec<f64>| {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        };
        Self {
            total: records.len(),
            failed: records.iter().filter(|r| r.is_failed()).count(),
            mean_wer: mean(records.iter().filter_map(|r| r.wer()).collect()),
            mean_eer: mean(records.iter().filter_map(|r| r.eer()).collect()),
        }
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} files, {} failed", self.total, self.failed)?;
        if let Some(wer) = self.mean_wer {
            write!(f, ", mean WER {wer:.3}")?;
        }
        if let Some(eer) = self.mean_eer {
            write!(f, ", mean EER {eer:.3}")?;
        }
        Ok(())
    }
}
