use serde::{Deserialize, Serialize};

use crate::shared::config::ConfigError;
use crate::shared::constants::{
    DEFAULT_BAND_HIGH_HZ, DEFAULT_BAND_LOW_HZ, DEFAULT_BAND_ORDER, DEFAULT_NOISE_STDDEV,
    DEFAULT_PITCH_SHIFT_SEMITONES, DEFAULT_TIME_STRETCH_RATE, DEFAULT_VTLN_WARP_RANGE,
    TIME_STRETCH_RATE_RANGE,
};

/// Which optional stages run. Pitch shift and noise always run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageToggles {
    pub time_stretch: bool,
    pub band_pass: bool,
    pub pitch_warp: bool,
}

impl StageToggles {
    /// Pitch shift and noise only.
    pub fn minimal() -> Self {
        Self {
            time_stretch: false,
            band_pass: false,
            pitch_warp: false,
        }
    }
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            time_stretch: true,
            band_pass: true,
            pitch_warp: true,
        }
    }
}

/// Configuration for one anonymization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParameters {
    pub pitch_shift_semitones: f64,
    pub time_stretch_rate: f64,
    pub noise_stddev: f64,
    pub band_low_hz: f64,
    pub band_high_hz: f64,
    pub band_order: usize,
    pub vtln_warp_range: (f64, f64),
    pub stages: StageToggles,
}

impl Default for PipelineParameters {
    fn default() -> Self {
        Self {
            pitch_shift_semitones: DEFAULT_PITCH_SHIFT_SEMITONES,
            time_stretch_rate: DEFAULT_TIME_STRETCH_RATE,
            noise_stddev: DEFAULT_NOISE_STDDEV,
            band_low_hz: DEFAULT_BAND_LOW_HZ,
            band_high_hz: DEFAULT_BAND_HIGH_HZ,
            band_order: DEFAULT_BAND_ORDER,
            vtln_warp_range: DEFAULT_VTLN_WARP_RANGE,
            stages: StageToggles::default(),
        }
    }
}

impl PipelineParameters {
    /// Rejects values no stage could ever accept.
    ///
    /// Band edges are only checked against each other here; whether they fit
    /// under Nyquist depends on the input and is handled by the filter stage.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.pitch_shift_semitones.is_finite() {
            return Err(invalid("pitch_shift_semitones", "must be finite"));
        }
        let (min_rate, max_rate) = TIME_STRETCH_RATE_RANGE;
        if !(min_rate..=max_rate).contains(&self.time_stretch_rate) {
            return Err(invalid(
                "time_stretch_rate",
                &format!("must be between {min_rate} and {max_rate}"),
            ));
        }
        if !(self.noise_stddev.is_finite() && self.noise_stddev >= 0.0) {
            return Err(invalid("noise_stddev", "must be zero or positive"));
        }
        if !(self.band_low_hz.is_finite() && self.band_low_hz > 0.0) {
            return Err(invalid("band_low_hz", "must be positive"));
        }
        if !(self.band_high_hz.is_finite() && self.band_high_hz > self.band_low_hz) {
            return Err(invalid("band_high_hz", "must exceed band_low_hz"));
        }
        if self.band_order == 0 {
            return Err(invalid("band_order", "must be at least 1"));
        }
        let (min, max) = self.vtln_warp_range;
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(invalid("vtln_warp_range", "must satisfy 0 < min <= max"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
