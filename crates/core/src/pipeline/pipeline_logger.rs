use std::collections::BTreeMap;
use std::time::Instant;

use crate::evaluation::domain::evaluation_record::{EvaluationOutcome, EvaluationRecord};
use crate::pipeline::anonymization_pipeline::StageReport;

/// Observer for batch runs.
///
/// The batch runner reports every stage run and every finished item here;
/// implementations decide what to print or keep.
pub trait PipelineLogger: Send {
    /// Called after each item, with a 1-based position.
    fn progress(&mut self, current: usize, total: usize);

    /// One stage run on one item, including whether it fell back.
    fn stage(&mut self, report: &StageReport);

    /// Duration of a non-stage step (`load`, `transcribe`) for one item.
    fn step(&mut self, name: &str, duration_ms: f64);

    /// The record an item ended with.
    fn item_finished(&mut self, record: &EvaluationRecord);

    fn info(&mut self, message: &str);

    /// End-of-batch report. Default: nothing.
    fn summary(&self) {}
}

pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn stage(&mut self, _report: &StageReport) {}
    fn step(&mut self, _name: &str, _duration_ms: f64) {}
    fn item_finished(&mut self, _record: &EvaluationRecord) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageStats {
    pub runs: usize,
    pub fallbacks: usize,
    pub total_ms: f64,
}

impl StageStats {
    pub fn average_ms(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.total_ms / self.runs as f64
        }
    }
}

/// Logs throttled progress through `log` and prints a per-stage fallback and
/// failure breakdown when the batch ends.
pub struct StdoutPipelineLogger {
    throttle_files: usize,
    started: Instant,
    stages: BTreeMap<&'static str, StageStats>,
    steps: BTreeMap<String, StageStats>,
    failures: BTreeMap<&'static str, usize>,
    scored: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_files: usize) -> Self {
        Self {
            throttle_files: throttle_files.max(1),
            started: Instant::now(),
            stages: BTreeMap::new(),
            steps: BTreeMap::new(),
            failures: BTreeMap::new(),
            scored: 0,
        }
    }

    pub fn stage_stats(&self, stage: &str) -> Option<&StageStats> {
        self.stages.get(stage)
    }

    pub fn failures(&self, kind: &str) -> usize {
        self.failures.get(kind).copied().unwrap_or(0)
    }

    fn finished(&self) -> usize {
        self.scored + self.failures.values().sum::<usize>()
    }

    /// `None` until at least one item has finished.
    pub fn summary_string(&self) -> Option<String> {
        let finished = self.finished();
        if finished == 0 {
            return None;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Batch summary: {finished} files ({} scored, {} failed) in {elapsed:.1}s",
            self.scored,
            finished - self.scored
        )];
        for (kind, count) in &self.failures {
            lines.push(format!("  failed {kind}: {count}"));
        }
        for (name, stats) in &self.stages {
            lines.push(format!(
                "  {name:14} avg {:7.1}ms  fallbacks {}/{}",
                stats.average_ms(),
                stats.fallbacks,
                stats.runs
            ));
        }
        for (name, stats) in &self.steps {
            lines.push(format!("  {name:14} avg {:7.1}ms", stats.average_ms()));
        }
        if elapsed > 0.0 {
            lines.push(format!(
                "  Throughput: {:.2} files/s",
                finished as f64 / elapsed
            ));
        }
        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        if total > 0 && (current % self.throttle_files == 0 || current == total) {
            log::info!("Evaluated {current}/{total} files");
        }
    }

    fn stage(&mut self, report: &StageReport) {
        let stats = self.stages.entry(report.stage).or_default();
        stats.runs += 1;
        stats.total_ms += report.duration.as_secs_f64() * 1000.0;
        if report.fell_back() {
            stats.fallbacks += 1;
        }
    }

    fn step(&mut self, name: &str, duration_ms: f64) {
        let stats = self.steps.entry(name.to_string()).or_default();
        stats.runs += 1;
        stats.total_ms += duration_ms;
    }

    fn item_finished(&mut self, record: &EvaluationRecord) {
        match &record.outcome {
            EvaluationOutcome::Scored { .. } => self.scored += 1,
            EvaluationOutcome::Failed { kind, .. } => {
                *self.failures.entry(kind.as_str()).or_default() += 1;
            }
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
