use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_writer::AudioWriter;
use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::evaluation::domain::equal_error_rate::EerEstimator;
use crate::evaluation::domain::evaluation_record::{EvaluationRecord, FailureKind};
use crate::evaluation::domain::word_error_rate::word_error_rate;
use crate::pipeline::anonymization_pipeline::{AnonymizationPipeline, PipelineError};
use crate::pipeline::batch_manifest::BatchItem;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::constants::{ANONYMIZED_SUFFIX, DEFAULT_SEED, TARGET_SAMPLE_RATE};

/// Lifecycle of one batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Loaded,
    Anonymized,
    Transcribed,
    Scored,
    Recorded,
    Failed(FailureKind),
}

struct ItemFailure {
    kind: FailureKind,
    message: String,
}

impl ItemFailure {
    fn new(kind: FailureKind, message: impl ToString) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

struct ItemScores {
    wer: f64,
    eer: f64,
    seconds: f64,
}

/// Runs load -> anonymize -> transcribe -> score over a list of files.
///
/// Every input yields exactly one record, in input order. Item failures are
/// recorded and the batch moves on. Record ids and output files are unique
/// within a run: a repeated id gets `#<index>` appended and a repeated output
/// name gets `_<index>`.
pub struct BatchRunner {
    reader: Box<dyn AudioReader>,
    recognizer: Box<dyn SpeechRecognizer>,
    eer_estimator: Box<dyn EerEstimator>,
    pipeline: AnonymizationPipeline,
    logger: Box<dyn PipelineLogger>,
    writer: Option<(Box<dyn AudioWriter>, PathBuf)>,
    target_sample_rate: Option<u32>,
    seed: u64,
    used_ids: HashSet<String>,
    used_outputs: HashSet<PathBuf>,
}

impl BatchRunner {
    pub fn new(
        reader: Box<dyn AudioReader>,
        recognizer: Box<dyn SpeechRecognizer>,
        eer_estimator: Box<dyn EerEstimator>,
        pipeline: AnonymizationPipeline,
    ) -> Self {
        Self {
            reader,
            recognizer,
            eer_estimator,
            pipeline,
            logger: Box::new(NullPipelineLogger),
            writer: None,
            target_sample_rate: Some(TARGET_SAMPLE_RATE),
            seed: DEFAULT_SEED,
            used_ids: HashSet::new(),
            used_outputs: HashSet::new(),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Write each anonymized buffer into `dir` as `<stem>_anon.wav`.
    pub fn with_output(mut self, writer: Box<dyn AudioWriter>, dir: impl Into<PathBuf>) -> Self {
        self.writer = Some((writer, dir.into()));
        self
    }

    /// Resample every input to `rate` (16 kHz unless set); `None` keeps
    /// native rates.
    pub fn with_target_sample_rate(mut self, rate: Option<u32>) -> Self {
        self.target_sample_rate = rate;
        self
    }

    /// Item `i` is processed with an rng seeded from `seed + i`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn run(&mut self, items: &[BatchItem]) -> Vec<EvaluationRecord> {
        let total = items.len();
        self.used_ids.clear();
        self.used_outputs.clear();
        self.logger.info(&format!(
            "Evaluating {total} files through [{}]",
            self.pipeline.stage_names().join(" -> ")
        ));

        let mut records = Vec::with_capacity(total);
        for (index, item) in items.iter().enumerate() {
            let record = self.process_item(index, item);
            self.logger.item_finished(&record);
            records.push(record);
            self.logger.progress(index + 1, total);
        }

        self.logger.summary();
        records
    }

    fn process_item(&mut self, index: usize, item: &BatchItem) -> EvaluationRecord {
        let mut file_id = item.file_id();
        if !self.used_ids.insert(file_id.clone()) {
            file_id = format!("{file_id}#{index}");
            self.used_ids.insert(file_id.clone());
        }
        transition(&file_id, ItemState::Pending);

        match self.score_item(index, item, &file_id) {
            Ok(scores) => {
                transition(&file_id, ItemState::Recorded);
                EvaluationRecord::scored(file_id, scores.wer, scores.eer, scores.seconds)
            }
            Err(failure) => {
                log::warn!("{file_id}: {} ({})", failure.kind, failure.message);
                transition(&file_id, ItemState::Failed(failure.kind));
                EvaluationRecord::failed(file_id, failure.kind, failure.message)
            }
        }
    }

    fn score_item(
        &mut self,
        index: usize,
        item: &BatchItem,
        file_id: &str,
    ) -> Result<ItemScores, ItemFailure> {
        let start = Instant::now();

        let audio = self
            .reader
            .read_audio(&item.path, self.target_sample_rate)
            .map_err(|e| ItemFailure::new(FailureKind::UnreadableAudio, e))?;
        self.logger
            .step("load", start.elapsed().as_secs_f64() * 1000.0);
        transition(file_id, ItemState::Loaded);

        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(index as u64));
        let anonymized = self
            .pipeline
            .anonymize(&audio, &mut rng)
            .map_err(|e| match e {
                PipelineError::InsufficientAudioLength { .. } => {
                    ItemFailure::new(FailureKind::InsufficientAudioLength, e)
                }
                PipelineError::InvalidSampleRate | PipelineError::NonFiniteSample { .. } => {
                    ItemFailure::new(FailureKind::UnreadableAudio, e)
                }
            })?;
        for report in &anonymized.stages {
            self.logger.stage(report);
        }
        transition(file_id, ItemState::Anonymized);

        if let Some((writer, dir)) = &self.writer {
            let mut out_path = anonymized_path(dir, &item.path);
            if self.used_outputs.contains(&out_path) {
                out_path = indexed_path(&out_path, index);
            }
            self.used_outputs.insert(out_path.clone());
            writer
                .write_audio(&out_path, &anonymized.audio)
                .map_err(|e| ItemFailure::new(FailureKind::WriteFailed, e))?;
        }

        let transcribe_start = Instant::now();
        let hypothesis = self
            .recognizer
            .transcribe(&anonymized.audio)
            .map_err(|e| ItemFailure::new(FailureKind::TranscriptionFailed, e))?;
        self.logger.step(
            "transcribe",
            transcribe_start.elapsed().as_secs_f64() * 1000.0,
        );
        transition(file_id, ItemState::Transcribed);

        let wer = word_error_rate(&item.transcript, &hypothesis)
            .map_err(|e| ItemFailure::new(FailureKind::MetricFailed, e))?;
        // No speaker verifier produces trial scores yet.
        let eer = self.eer_estimator.equal_error_rate(&[], &[]).clamp(0.0, 1.0);
        let seconds = start.elapsed().as_secs_f64();
        transition(file_id, ItemState::Scored);

        Ok(ItemScores { wer, eer, seconds })
    }
}

fn transition(file_id: &str, state: ItemState) {
    log::debug!("{file_id}: {state:?}");
}

/// `<dir>/<stem>_anon.wav` for an input path.
pub fn anonymized_path(dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    dir.join(format!("{stem}{ANONYMIZED_SUFFIX}.wav"))
}

/// `x_anon.wav` -> `x_anon_<index>.wav`.
fn indexed_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_{index}.wav"))
}
