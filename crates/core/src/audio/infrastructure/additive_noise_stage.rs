use rand::RngCore;
use rand_distr::{Distribution, Normal};

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::stage_error::StageError;
use crate::audio::domain::transform_stage::TransformStage;

/// Adds zero-mean Gaussian noise drawn from the caller's random source.
pub struct AdditiveNoiseStage {
    stddev: f64,
}

impl AdditiveNoiseStage {
    pub fn new(stddev: f64) -> Self {
        Self { stddev }
    }
}

impl TransformStage for AdditiveNoiseStage {
    fn name(&self) -> &'static str {
        "additive_noise"
    }

    fn apply(&self, audio: &AudioBuffer, rng: &mut dyn RngCore) -> Result<AudioBuffer, StageError> {
        if !(self.stddev.is_finite() && self.stddev >= 0.0) {
            return Err(StageError::InvalidParameter {
                name: "noise_stddev",
                value: self.stddev,
            });
        }
        if self.stddev == 0.0 {
            return Ok(audio.clone());
        }

        let normal = Normal::new(0.0, self.stddev)
            .map_err(|e| StageError::Numerical(format!("noise distribution: {e}")))?;
        let samples = audio
            .samples()
            .iter()
            .map(|&s| (s as f64 + normal.sample(&mut *rng)) as f32)
            .collect();
        Ok(audio.with_samples(samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_stddev_is_identity() {
        let audio = AudioBuffer::new(vec![0.1, -0.2, 0.3], 16000);
        let mut rng = StdRng::seed_from_u64(1);
        let out = AdditiveNoiseStage::new(0.0).apply(&audio, &mut rng).unwrap();
        assert_eq!(out, audio);
    }

    #[test]
    fn test_same_seed_same_noise() {
        let audio = AudioBuffer::silence(1000, 16000);
        let stage = AdditiveNoiseStage::new(0.01);
        let a = stage.apply(&audio, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = stage.apply(&audio, &mut StdRng::seed_from_u64(9)).unwrap();
        let c = stage.apply(&audio, &mut StdRng::seed_from_u64(10)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_noise_statistics() {
        let audio = AudioBuffer::silence(100_000, 16000);
        let mut rng = StdRng::seed_from_u64(3);
        let out = AdditiveNoiseStage::new(0.01).apply(&audio, &mut rng).unwrap();
        let n = out.len() as f64;
        let mean = out.samples().iter().map(|&s| s as f64).sum::<f64>() / n;
        let var = out
            .samples()
            .iter()
            .map(|&s| (s as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        assert!(mean.abs() < 1e-3, "mean {mean}");
        assert_relative_eq!(var.sqrt(), 0.01, max_relative = 0.05);
    }

    #[test]
    fn test_negative_stddev_is_error() {
        let audio = AudioBuffer::silence(10, 16000);
        let mut rng = StdRng::seed_from_u64(1);
        let result = AdditiveNoiseStage::new(-1.0).apply(&audio, &mut rng);
        assert!(matches!(result, Err(StageError::InvalidParameter { .. })));
    }
}
