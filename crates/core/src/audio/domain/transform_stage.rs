use rand::RngCore;

use super::audio_buffer::AudioBuffer;
use super::stage_error::StageError;

/// Domain interface for one anonymization DSP step.
///
/// Implementations are pure given the random source: the same input and the
/// same rng state always produce the same output. The input is borrowed so a
/// failing stage leaves it untouched for fallback.
pub trait TransformStage: Send {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        audio: &AudioBuffer,
        rng: &mut dyn RngCore,
    ) -> Result<AudioBuffer, StageError>;
}
