use rand::{Rng, RngCore};

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::stage_error::StageError;
use crate::audio::domain::transform_stage::TransformStage;
use crate::audio::infrastructure::pitch_shift_stage::shift_pitch;

/// VTLN-style warp: a random vocal-tract scale factor applied as a pitch shift.
///
/// The factor is drawn uniformly from `[min, max]` and converted to
/// `12 * log2(factor)` semitones.
pub struct PitchWarpStage {
    warp_range: (f64, f64),
}

impl PitchWarpStage {
    pub fn new(warp_range: (f64, f64)) -> Self {
        Self { warp_range }
    }

    /// Draw a warp factor from the configured range.
    pub fn draw_factor(&self, rng: &mut dyn RngCore) -> Result<f64, StageError> {
        let (min, max) = self.warp_range;
        if !(min.is_finite() && max.is_finite() && min > 0.0) {
            return Err(StageError::InvalidParameter {
                name: "vtln_warp_min",
                value: min,
            });
        }
        if max < min {
            return Err(StageError::InvalidParameter {
                name: "vtln_warp_max",
                value: max,
            });
        }
        if min == max {
            return Ok(min);
        }
        Ok(rng.gen_range(min..=max))
    }
}

/// Semitone shift equivalent to scaling frequencies by `factor`.
pub fn warp_factor_to_semitones(factor: f64) -> f64 {
    12.0 * factor.log2()
}

impl TransformStage for PitchWarpStage {
    fn name(&self) -> &'static str {
        "pitch_warp"
    }

    fn apply(&self, audio: &AudioBuffer, rng: &mut dyn RngCore) -> Result<AudioBuffer, StageError> {
        let factor = self.draw_factor(rng)?;
        let semitones = warp_factor_to_semitones(factor);
        log::debug!("Pitch warp factor {factor:.4} ({semitones:+.3} semitones)");
        shift_pitch(audio, semitones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[rstest]
    #[case::identity(1.0, 0.0)]
    #[case::octave_up(2.0, 12.0)]
    #[case::octave_down(0.5, -12.0)]
    fn test_factor_to_semitones(#[case] factor: f64, #[case] expected: f64) {
        assert_abs_diff_eq!(warp_factor_to_semitones(factor), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_draw_within_range() {
        let stage = PitchWarpStage::new((0.9, 1.1));
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1000 {
            let f = stage.draw_factor(&mut rng).unwrap();
            assert!((0.9..=1.1).contains(&f));
        }
    }

    #[test]
    fn test_degenerate_range_is_fixed_factor() {
        let stage = PitchWarpStage::new((1.0, 1.0));
        let audio = AudioBuffer::new(vec![0.25; 4096], 16000);
        let mut rng = StdRng::seed_from_u64(5);
        let out = stage.apply(&audio, &mut rng).unwrap();
        assert_eq!(out, audio);
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let samples = (0..16000)
            .map(|i| (i as f32 * 0.05).sin() * 0.4)
            .collect();
        let audio = AudioBuffer::new(samples, 16000);
        let stage = PitchWarpStage::new((0.9, 1.1));
        let a = stage.apply(&audio, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = stage.apply(&audio, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), audio.len());
    }

    #[rstest]
    #[case::zero_min((0.0, 1.1))]
    #[case::inverted((1.1, 0.9))]
    fn test_invalid_range_is_error(#[case] range: (f64, f64)) {
        let stage = PitchWarpStage::new(range);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            stage.draw_factor(&mut rng),
            Err(StageError::InvalidParameter { .. })
        ));
    }
}
