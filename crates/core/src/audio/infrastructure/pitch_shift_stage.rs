use rand::RngCore;
use rustfft::num_complex::Complex;

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::stage_error::StageError;
use crate::audio::domain::transform_stage::TransformStage;
use crate::audio::infrastructure::phase_vocoder::{wrap_phase, PhaseVocoder};

/// Phase vocoder-based pitch shifter.
///
/// Shifts pitch by a configurable number of semitones using
/// STFT -> frequency bin shifting -> ISTFT with overlap-add. Duration is
/// preserved exactly.
pub struct PitchShiftStage {
    semitones: f64,
}

impl PitchShiftStage {
    pub fn new(semitones: f64) -> Self {
        Self { semitones }
    }
}

impl TransformStage for PitchShiftStage {
    fn name(&self) -> &'static str {
        "pitch_shift"
    }

    fn apply(&self, audio: &AudioBuffer, _: &mut dyn RngCore) -> Result<AudioBuffer, StageError> {
        shift_pitch(audio, self.semitones)
    }
}

/// Shift `audio` by `semitones`, keeping its length.
///
/// Shared by the constant shift stage and the randomized pitch warp.
pub fn shift_pitch(audio: &AudioBuffer, semitones: f64) -> Result<AudioBuffer, StageError> {
    if !semitones.is_finite() {
        return Err(StageError::InvalidParameter {
            name: "semitones",
            value: semitones,
        });
    }
    // Zero semitone shift is identity
    if semitones.abs() < 1e-10 || audio.is_empty() {
        return Ok(audio.clone());
    }

    let vocoder = PhaseVocoder::default();
    let shift_ratio = 2.0_f64.powf(semitones / 12.0);
    let bins = vocoder.bins();
    let expected = vocoder.expected_phase_advance();

    let mut prev_phase = vec![0.0f64; bins];
    let mut synth_phase = vec![0.0f64; bins];

    let frames: Vec<Vec<Complex<f64>>> = vocoder
        .analyze(audio.samples())
        .into_iter()
        .map(|spectrum| {
            let magnitudes: Vec<f64> = spectrum.iter().map(|c| c.norm()).collect();
            let phases: Vec<f64> = spectrum.iter().map(|c| c.im.atan2(c.re)).collect();

            // Instantaneous frequency per bin, in radians per hop
            let inst_freq: Vec<f64> = (0..bins)
                .map(|k| expected[k] + wrap_phase(phases[k] - prev_phase[k] - expected[k]))
                .collect();

            // Map each analysis bin to a synthesis bin. Keep the louder source
            // when several land on the same target to avoid amplitude blowup.
            let mut new_magnitudes = vec![0.0f64; bins];
            let mut new_inst_freq = vec![0.0f64; bins];
            for k in 0..bins {
                let new_bin = (k as f64 * shift_ratio).round() as usize;
                if new_bin < bins && magnitudes[k] > new_magnitudes[new_bin] {
                    new_magnitudes[new_bin] = magnitudes[k];
                    new_inst_freq[new_bin] = inst_freq[k] * shift_ratio;
                }
            }

            for k in 0..bins {
                synth_phase[k] += new_inst_freq[k];
            }
            prev_phase.copy_from_slice(&phases);

            (0..bins)
                .map(|k| Complex::from_polar(new_magnitudes[k], synth_phase[k]))
                .collect()
        })
        .collect();

    let output = vocoder.synthesize(&frames, audio.len());
    if output.iter().any(|s| !s.is_finite()) {
        return Err(StageError::Numerical(
            "pitch shift produced non-finite samples".to_string(),
        ));
    }

    // Peak-normalize: output peak must not exceed input peak
    let input_peak = audio.peak() as f64;
    let output_peak = output.iter().map(|s| s.abs()).fold(0.0f64, f64::max);
    let gain = if output_peak > 1e-10 && output_peak > input_peak {
        input_peak / output_peak
    } else {
        1.0
    };

    Ok(audio.with_samples(output.iter().map(|s| (s * gain) as f32).collect()))
}
