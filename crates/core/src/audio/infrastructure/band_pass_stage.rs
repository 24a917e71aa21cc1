use std::f64::consts::PI;

use rand::RngCore;
use rustfft::num_complex::Complex;

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::stage_error::StageError;
use crate::audio::domain::transform_stage::TransformStage;

/// One second-order section in direct form II transposed. `a[0]` is 1.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Biquad {
    b: [f64; 3],
    a: [f64; 3],
}

impl Biquad {
    /// Steady-state DF2T state for a unit step input, and the step gain.
    fn step_state(&self) -> ([f64; 2], f64) {
        let denom = self.a[0] + self.a[1] + self.a[2];
        let gain = (self.b[0] + self.b[1] + self.b[2]) / denom;
        let z2 = self.b[2] - self.a[2] * gain;
        let z1 = self.b[1] - self.a[1] * gain + z2;
        ([z1, z2], gain)
    }

    fn magnitude_at(&self, omega: f64) -> f64 {
        let z1 = Complex::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b[0] + z1 * self.b[1] + z2 * self.b[2];
        let den = self.a[0] + z1 * self.a[1] + z2 * self.a[2];
        (num / den).norm()
    }
}

/// Zero-phase Butterworth band-pass.
///
/// The analog prototype is converted with the bilinear transform into
/// cascaded second-order sections, then run forward and backward over an
/// odd-extended copy of the signal.
pub struct BandPassStage {
    low_hz: f64,
    high_hz: f64,
    order: usize,
}

impl BandPassStage {
    pub fn new(low_hz: f64, high_hz: f64, order: usize) -> Self {
        Self {
            low_hz,
            high_hz,
            order,
        }
    }

    fn design(&self, sample_rate: u32) -> Result<Vec<Biquad>, StageError> {
        let nyquist = sample_rate as f64 / 2.0;
        let valid = self.order > 0
            && self.low_hz.is_finite()
            && self.high_hz.is_finite()
            && self.low_hz > 0.0
            && self.low_hz < self.high_hz
            && self.high_hz < nyquist;
        if !valid {
            return Err(StageError::InvalidFilter {
                low_hz: self.low_hz,
                high_hz: self.high_hz,
                order: self.order,
                sample_rate,
            });
        }

        let fs2 = 2.0 * sample_rate as f64;
        // Pre-warp the band edges
        let w1 = fs2 * (PI * self.low_hz / sample_rate as f64).tan();
        let w2 = fs2 * (PI * self.high_hz / sample_rate as f64).tan();
        let w0 = (w1 * w2).sqrt();
        let bw = w2 - w1;

        let n = self.order;
        let mut complex_poles = Vec::with_capacity(n);
        let mut real_poles = Vec::new();
        for k in 1..=n {
            let lp_pole = if 2 * k + n - 1 == 2 * n {
                Complex::new(-1.0, 0.0)
            } else {
                Complex::from_polar(1.0, PI * (2 * k + n - 1) as f64 / (2 * n) as f64)
            };
            // Low-pass to band-pass: s^2 - p*bw*s + w0^2 = 0
            let pb = lp_pole * bw;
            let disc = (pb * pb - 4.0 * w0 * w0).sqrt();
            for s in [(pb + disc) / 2.0, (pb - disc) / 2.0] {
                let z = (fs2 + s) / (fs2 - s);
                if z.im > 1e-12 {
                    complex_poles.push(z);
                } else if z.im.abs() <= 1e-12 {
                    real_poles.push(z.re);
                }
            }
        }

        if complex_poles.iter().any(|p| p.norm() >= 1.0)
            || real_poles.iter().any(|p| p.abs() >= 1.0)
        {
            return Err(StageError::Numerical(
                "band-pass design produced unstable poles".to_string(),
            ));
        }

        let mut denominators: Vec<[f64; 3]> = complex_poles
            .iter()
            .map(|p| [1.0, -2.0 * p.re, p.norm_sqr()])
            .collect();
        real_poles.sort_by(|a, b| a.total_cmp(b));
        for pair in real_poles.chunks(2) {
            match pair {
                [r1, r2] => denominators.push([1.0, -(r1 + r2), r1 * r2]),
                [r] => denominators.push([1.0, -r, 0.0]),
                _ => {}
            }
        }
        if denominators.len() != n {
            return Err(StageError::Numerical(format!(
                "expected {n} filter sections, designed {}",
                denominators.len()
            )));
        }

        // Each section carries one zero at DC and one at Nyquist; scale so
        // the cascade has unit gain at the geometric centre frequency.
        let center = 2.0 * (w0 / fs2).atan();
        let sections = denominators
            .into_iter()
            .map(|a| {
                let raw = Biquad {
                    b: [1.0, 0.0, -1.0],
                    a,
                };
                let g = raw.magnitude_at(center);
                Biquad {
                    b: [1.0 / g, 0.0, -1.0 / g],
                    a,
                }
            })
            .collect();
        Ok(sections)
    }
}

impl TransformStage for BandPassStage {
    fn name(&self) -> &'static str {
        "band_pass"
    }

    fn apply(&self, audio: &AudioBuffer, _: &mut dyn RngCore) -> Result<AudioBuffer, StageError> {
        let sections = self.design(audio.sample_rate())?;
        let pad_len = 3 * (2 * sections.len() + 1);
        if audio.len() <= pad_len {
            return Err(StageError::SignalTooShort {
                len: audio.len(),
                required: pad_len,
            });
        }

        let samples: Vec<f64> = audio.samples().iter().map(|&s| s as f64).collect();
        let filtered = filtfilt(&sections, &samples, pad_len);
        if filtered.iter().any(|s| !s.is_finite()) {
            return Err(StageError::Numerical(
                "band-pass produced non-finite samples".to_string(),
            ));
        }
        Ok(audio.with_samples(filtered.iter().map(|&s| s as f32).collect()))
    }
}

/// Forward-backward filtering with odd extension and steady-state initial
/// conditions. Requires `x.len() > pad_len`.
fn filtfilt(sections: &[Biquad], x: &[f64], pad_len: usize) -> Vec<f64> {
    let n = x.len();
    let mut ext = Vec::with_capacity(n + 2 * pad_len);
    ext.extend((1..=pad_len).rev().map(|i| 2.0 * x[0] - x[i]));
    ext.extend_from_slice(x);
    ext.extend((1..=pad_len).map(|i| 2.0 * x[n - 1] - x[n - 1 - i]));

    let x0 = ext[0];
    let mut forward = cascade(sections, &ext, x0);
    forward.reverse();
    let y0 = forward[0];
    let mut backward = cascade(sections, &forward, y0);
    backward.reverse();

    backward[pad_len..pad_len + n].to_vec()
}

/// Run `x` through every section, each started at its steady state for a
/// constant input of `initial`.
fn cascade(sections: &[Biquad], x: &[f64], initial: f64) -> Vec<f64> {
    let mut signal = x.to_vec();
    let mut level = initial;
    for section in sections {
        let ([z1, z2], gain) = section.step_state();
        let mut state = [z1 * level, z2 * level];
        for sample in signal.iter_mut() {
            let input = *sample;
            let y = section.b[0] * input + state[0];
            state[0] = section.b[1] * input - section.a[1] * y + state[1];
            state[1] = section.b[2] * input - section.a[2] * y;
            *sample = y;
        }
        level *= gain;
    }
    signal
}
