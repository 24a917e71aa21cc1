use crate::shared::constants::PLACEHOLDER_EER;

/// Speaker-verification error estimate from verifier scores.
///
/// `genuine` holds scores for same-speaker trials (enrolled vs. original
/// audio); `impostor` holds scores for trials against anonymized audio.
/// Implementations return a value in [0, 1].
pub trait EerEstimator: Send {
    fn equal_error_rate(&self, genuine: &[f64], impostor: &[f64]) -> f64;
}

/// Fixed EER used until a real speaker verifier is integrated.
///
/// Ignores the scores entirely.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderEerEstimator {
    value: f64,
}

impl PlaceholderEerEstimator {
    pub fn new(value: f64) -> Self {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            PLACEHOLDER_EER
        };
        Self { value }
    }
}

impl Default for PlaceholderEerEstimator {
    fn default() -> Self {
        Self::new(PLACEHOLDER_EER)
    }
}

impl EerEstimator for PlaceholderEerEstimator {
    fn equal_error_rate(&self, _genuine: &[f64], _impostor: &[f64]) -> f64 {
        self.value
    }
}
