use std::time::{Duration, Instant};

use rand::RngCore;
use thiserror::Error;

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::pipeline_parameters::PipelineParameters;
use crate::audio::domain::stage_error::StageError;
use crate::audio::domain::transform_result::TransformResult;
use crate::audio::domain::transform_stage::TransformStage;
use crate::audio::infrastructure::additive_noise_stage::AdditiveNoiseStage;
use crate::audio::infrastructure::band_pass_stage::BandPassStage;
use crate::audio::infrastructure::pitch_shift_stage::PitchShiftStage;
use crate::audio::infrastructure::pitch_warp_stage::PitchWarpStage;
use crate::audio::infrastructure::time_stretch_stage::TimeStretchStage;
use crate::shared::constants::MIN_DURATION_SECONDS;

/// Failures surfaced to the caller. Stage-local failures never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("audio too short: {samples} samples, need at least {required}")]
    InsufficientAudioLength { samples: usize, required: usize },

    #[error("sample rate must be positive")]
    InvalidSampleRate,

    #[error("sample {index} is not a finite number")]
    NonFiniteSample { index: usize },
}

/// What happened in one stage of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: &'static str,
    pub error: Option<StageError>,
    pub duration: Duration,
}

impl StageReport {
    pub fn fell_back(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct AnonymizedAudio {
    pub audio: AudioBuffer,
    pub stages: Vec<StageReport>,
}

impl AnonymizedAudio {
    pub fn fallbacks(&self) -> impl Iterator<Item = &StageReport> {
        self.stages.iter().filter(|s| s.fell_back())
    }
}

/// An ordered chain of transform stages followed by a clamp to [-1, 1].
pub struct AnonymizationPipeline {
    stages: Vec<Box<dyn TransformStage>>,
}

impl AnonymizationPipeline {
    pub fn new(stages: Vec<Box<dyn TransformStage>>) -> Self {
        Self { stages }
    }

    /// The default chain: pitch shift, time stretch, noise, band-pass, pitch
    /// warp. Disabled optional stages are left out.
    pub fn from_parameters(params: &PipelineParameters) -> Self {
        let mut stages: Vec<Box<dyn TransformStage>> =
            vec![Box::new(PitchShiftStage::new(params.pitch_shift_semitones))];
        if params.stages.time_stretch {
            stages.push(Box::new(TimeStretchStage::new(params.time_stretch_rate)));
        }
        stages.push(Box::new(AdditiveNoiseStage::new(params.noise_stddev)));
        if params.stages.band_pass {
            stages.push(Box::new(BandPassStage::new(
                params.band_low_hz,
                params.band_high_hz,
                params.band_order,
            )));
        }
        if params.stages.pitch_warp {
            stages.push(Box::new(PitchWarpStage::new(params.vtln_warp_range)));
        }
        Self::new(stages)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order on a copy of `audio`.
    ///
    /// Requires at least one second of finite audio. A failing stage is replaced by
    /// its input and reported in the returned stage list.
    pub fn anonymize(
        &self,
        audio: &AudioBuffer,
        rng: &mut dyn RngCore,
    ) -> Result<AnonymizedAudio, PipelineError> {
        if audio.sample_rate() == 0 {
            return Err(PipelineError::InvalidSampleRate);
        }
        let required = (audio.sample_rate() * MIN_DURATION_SECONDS) as usize;
        if audio.len() < required {
            return Err(PipelineError::InsufficientAudioLength {
                samples: audio.len(),
                required,
            });
        }
        if let Some(index) = audio.samples().iter().position(|s| !s.is_finite()) {
            return Err(PipelineError::NonFiniteSample { index });
        }

        let mut current = audio.clone();
        let mut reports = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let start = Instant::now();
            let (output, error) = TransformResult::run(stage.as_ref(), current, rng).into_parts();
            let duration = start.elapsed();
            log::debug!(
                "Stage {} took {:.1}ms{}",
                stage.name(),
                duration.as_secs_f64() * 1000.0,
                if error.is_some() { " (fallback)" } else { "" }
            );
            reports.push(StageReport {
                stage: stage.name(),
                error,
                duration,
            });
            current = output;
        }

        current.clamp();
        Ok(AnonymizedAudio {
            audio: current,
            stages: reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::pipeline_parameters::StageToggles;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::{Arc, Mutex};

    fn speech_like(duration: f64, sample_rate: u32, amplitude: f64) -> AudioBuffer {
        let len = (duration * sample_rate as f64) as usize;
        let samples = (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                let f = 2.0 * std::f64::consts::PI * 150.0 * t;
                (amplitude * (f.sin() + 0.5 * (2.0 * f).sin() + 0.25 * (3.0 * f).sin())) as f32
            })
            .collect();
        AudioBuffer::new(samples, sample_rate)
    }

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl TransformStage for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn apply(&self, audio: &AudioBuffer, _: &mut dyn RngCore) -> Result<AudioBuffer, StageError> {
            self.log.lock().unwrap().push(self.name);
            Ok(audio.clone())
        }
    }

    struct Failing;

    impl TransformStage for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn apply(&self, _: &AudioBuffer, _: &mut dyn RngCore) -> Result<AudioBuffer, StageError> {
            Err(StageError::Numerical("diverged".to_string()))
        }
    }

    struct Amplify(f32);

    impl TransformStage for Amplify {
        fn name(&self) -> &'static str {
            "amplify"
        }

        fn apply(&self, audio: &AudioBuffer, _: &mut dyn RngCore) -> Result<AudioBuffer, StageError> {
            Ok(audio.with_samples(audio.samples().iter().map(|s| s * self.0).collect()))
        }
    }

    #[test]
    fn test_default_stage_order() {
        let pipeline = AnonymizationPipeline::from_parameters(&PipelineParameters::default());
        assert_eq!(
            pipeline.stage_names(),
            vec!["pitch_shift", "time_stretch", "additive_noise", "band_pass", "pitch_warp"]
        );
    }

    #[test]
    fn test_minimal_stage_order() {
        let params = PipelineParameters {
            stages: StageToggles::minimal(),
            ..Default::default()
        };
        let pipeline = AnonymizationPipeline::from_parameters(&params);
        assert_eq!(pipeline.stage_names(), vec!["pitch_shift", "additive_noise"]);
    }

    #[test]
    fn test_custom_order_is_respected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = AnonymizationPipeline::new(vec![
            Box::new(Recording { name: "second", log: log.clone() }),
            Box::new(Recording { name: "first", log: log.clone() }),
        ]);
        let audio = AudioBuffer::silence(16000, 16000);
        pipeline.anonymize(&audio, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["second", "first"]);
    }

    #[test]
    fn test_output_is_clamped() {
        let audio = speech_like(1.0, 16000, 0.5);
        let pipeline = AnonymizationPipeline::new(vec![Box::new(Amplify(10.0))]);
        let out = pipeline.anonymize(&audio, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(out.audio.samples().iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(out.audio.peak(), 1.0);
    }

    #[test]
    fn test_full_default_pipeline_stays_in_range() {
        let audio = speech_like(1.5, 16000, 0.55);
        let pipeline = AnonymizationPipeline::from_parameters(&PipelineParameters::default());
        let out = pipeline.anonymize(&audio, &mut StdRng::seed_from_u64(42)).unwrap();
        assert!(out.audio.samples().iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(out.audio.sample_rate(), 16000);
        assert_eq!(out.audio.len(), audio.len());
        assert_eq!(out.fallbacks().count(), 0);
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let audio = speech_like(1.0, 16000, 0.3);
        let pipeline = AnonymizationPipeline::from_parameters(&PipelineParameters::default());
        let a = pipeline.anonymize(&audio, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = pipeline.anonymize(&audio, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a.audio, b.audio);
    }

    #[test]
    fn test_short_input_is_rejected_and_untouched() {
        let audio = speech_like(0.5, 16000, 0.3);
        let before = audio.clone();
        let pipeline = AnonymizationPipeline::from_parameters(&PipelineParameters::default());
        let result = pipeline.anonymize(&audio, &mut StdRng::seed_from_u64(0));
        assert_eq!(
            result.unwrap_err(),
            PipelineError::InsufficientAudioLength {
                samples: 8000,
                required: 16000
            }
        );
        assert_eq!(audio, before);
    }

    #[test]
    fn test_exactly_one_second_is_accepted() {
        let audio = AudioBuffer::silence(8000, 8000);
        let pipeline = AnonymizationPipeline::new(vec![]);
        assert!(pipeline.anonymize(&audio, &mut StdRng::seed_from_u64(0)).is_ok());
    }

    #[test]
    fn test_zero_sample_rate_is_rejected() {
        let audio = AudioBuffer::silence(100, 0);
        let pipeline = AnonymizationPipeline::new(vec![]);
        assert_eq!(
            pipeline.anonymize(&audio, &mut StdRng::seed_from_u64(0)).unwrap_err(),
            PipelineError::InvalidSampleRate
        );
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let mut audio = speech_like(1.0, 16000, 0.2);
        let mut samples = audio.samples().to_vec();
        samples[100] = f32::NAN;
        audio = audio.with_samples(samples);

        let pipeline = AnonymizationPipeline::from_parameters(&PipelineParameters::default());
        assert_eq!(
            pipeline.anonymize(&audio, &mut StdRng::seed_from_u64(0)).unwrap_err(),
            PipelineError::NonFiniteSample { index: 100 }
        );
    }

    #[test]
    fn test_failing_stage_falls_back_and_continues() {
        let audio = speech_like(1.0, 16000, 0.2);
        let pipeline = AnonymizationPipeline::new(vec![
            Box::new(Failing),
            Box::new(Amplify(2.0)),
        ]);
        let out = pipeline.anonymize(&audio, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(out.stages.len(), 2);
        assert!(out.stages[0].fell_back());
        assert!(!out.stages[1].fell_back());
        for (a, b) in audio.samples().iter().zip(out.audio.samples()) {
            assert_eq!(a * 2.0, *b);
        }
    }

    #[test]
    fn test_band_pass_above_nyquist_falls_back() {
        // 3400 Hz upper edge is above Nyquist for 6 kHz audio
        let audio = speech_like(1.0, 6000, 0.3);
        let params = PipelineParameters {
            noise_stddev: 0.0,
            pitch_shift_semitones: 0.0,
            stages: StageToggles {
                time_stretch: false,
                band_pass: true,
                pitch_warp: false,
            },
            ..Default::default()
        };
        let pipeline = AnonymizationPipeline::from_parameters(&params);
        let out = pipeline.anonymize(&audio, &mut StdRng::seed_from_u64(0)).unwrap();
        let band = out.stages.iter().find(|s| s.stage == "band_pass").unwrap();
        assert!(matches!(band.error, Some(StageError::InvalidFilter { .. })));
        assert_eq!(out.audio, audio);
    }

    #[test]
    fn test_time_stretch_changes_length() {
        let audio = speech_like(2.0, 16000, 0.3);
        let params = PipelineParameters {
            time_stretch_rate: 1.1,
            ..Default::default()
        };
        let pipeline = AnonymizationPipeline::from_parameters(&params);
        let out = pipeline.anonymize(&audio, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(out.audio.len(), (32000.0f64 / 1.1).round() as usize);
    }
}
