use rand::RngCore;

use super::audio_buffer::AudioBuffer;
use super::stage_error::StageError;
use super::transform_stage::TransformStage;

/// Outcome of running one stage with fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformResult {
    Applied(AudioBuffer),
    /// The stage failed; `output` is the unchanged stage input.
    Fallback {
        output: AudioBuffer,
        error: StageError,
    },
}

impl TransformResult {
    /// Runs `stage` on `input`, substituting the input on failure.
    pub fn run(stage: &dyn TransformStage, input: AudioBuffer, rng: &mut dyn RngCore) -> Self {
        match stage.apply(&input, rng) {
            Ok(output) => TransformResult::Applied(output),
            Err(error) => {
                log::warn!("Stage '{}' failed, passing input through: {error}", stage.name());
                TransformResult::Fallback {
                    output: input,
                    error,
                }
            }
        }
    }

    pub fn error(&self) -> Option<&StageError> {
        match self {
            TransformResult::Applied(_) => None,
            TransformResult::Fallback { error, .. } => Some(error),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TransformResult::Fallback { .. })
    }

    pub fn into_parts(self) -> (AudioBuffer, Option<StageError>) {
        match self {
            TransformResult::Applied(output) => (output, None),
            TransformResult::Fallback { output, error } => (output, Some(error)),
        }
    }
}
