use rand::RngCore;
use rustfft::num_complex::Complex;

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::stage_error::StageError;
use crate::audio::domain::transform_stage::TransformStage;
use crate::audio::infrastructure::phase_vocoder::{wrap_phase, PhaseVocoder};
use crate::shared::constants::TIME_STRETCH_RATE_RANGE;

/// Phase vocoder time-scale modification.
///
/// `rate > 1` speeds speech up (shorter output), `rate < 1` slows it down.
/// Pitch is unchanged. Output length is `round(len / rate)`.
pub struct TimeStretchStage {
    rate: f64,
}

impl TimeStretchStage {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl TransformStage for TimeStretchStage {
    fn name(&self) -> &'static str {
        "time_stretch"
    }

    fn apply(&self, audio: &AudioBuffer, _: &mut dyn RngCore) -> Result<AudioBuffer, StageError> {
        let (min_rate, max_rate) = TIME_STRETCH_RATE_RANGE;
        if !(min_rate..=max_rate).contains(&self.rate) {
            return Err(StageError::InvalidParameter {
                name: "time_stretch_rate",
                value: self.rate,
            });
        }
        if (self.rate - 1.0).abs() < 1e-10 || audio.is_empty() {
            return Ok(audio.clone());
        }

        let target_len = (audio.len() as f64 / self.rate).round() as usize;
        let vocoder = PhaseVocoder::default();
        let analysis = vocoder.analyze(audio.samples());
        let last = analysis.len() - 1;
        let bins = vocoder.bins();
        let expected = vocoder.expected_phase_advance();

        // Seed the phase accumulator from the first analysis frame
        let mut phase_acc: Vec<f64> = analysis[0].iter().map(|c| c.im.atan2(c.re)).collect();
        let synth_frames = vocoder.frame_count(target_len);

        let mut frames: Vec<Vec<Complex<f64>>> = Vec::with_capacity(synth_frames);
        for j in 0..synth_frames {
            let t = (j as f64 * self.rate).min(last as f64);
            let i0 = t.floor() as usize;
            let i1 = (i0 + 1).min(last);
            let alpha = t - i0 as f64;
            let (left, right) = (&analysis[i0], &analysis[i1]);

            let frame = (0..bins)
                .map(|k| {
                    let magnitude = (1.0 - alpha) * left[k].norm() + alpha * right[k].norm();
                    Complex::from_polar(magnitude, phase_acc[k])
                })
                .collect();
            frames.push(frame);

            for k in 0..bins {
                let delta = right[k].arg() - left[k].arg() - expected[k];
                phase_acc[k] += expected[k] + wrap_phase(delta);
            }
        }

        let output = vocoder.synthesize(&frames, target_len);
        if output.iter().any(|s| !s.is_finite()) {
            return Err(StageError::Numerical(
                "time stretch produced non-finite samples".to_string(),
            ));
        }

        log::debug!(
            "Time stretch x{:.3}: {} -> {} samples",
            self.rate,
            audio.len(),
            target_len
        );
        Ok(audio.with_samples(output.iter().map(|&s| s as f32).collect()))
    }
}
