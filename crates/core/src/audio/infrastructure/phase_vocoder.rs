use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// STFT analysis/synthesis window size.
pub const WINDOW_SIZE: usize = 2048;

/// Hop size between successive STFT frames.
pub const HOP_SIZE: usize = 512;

/// Shared STFT front/back end for the pitch and tempo stages.
///
/// Frames are centred: the signal is zero-padded by half a window on each
/// side so the first and last samples get full overlap-add coverage.
pub struct PhaseVocoder {
    window_size: usize,
    hop_size: usize,
    hann: Vec<f64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl PhaseVocoder {
    pub fn new(window_size: usize, hop_size: usize) -> Self {
        let hann = (0..window_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / window_size as f64).cos()))
            .collect();
        let mut planner = FftPlanner::<f64>::new();
        Self {
            window_size,
            hop_size,
            hann,
            forward: planner.plan_fft_forward(window_size),
            inverse: planner.plan_fft_inverse(window_size),
        }
    }

    /// Number of non-negative frequency bins per frame.
    pub fn bins(&self) -> usize {
        self.window_size / 2 + 1
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Phase a stationary sinusoid centred on bin `k` advances per hop.
    pub fn expected_phase_advance(&self) -> Vec<f64> {
        (0..self.bins())
            .map(|k| 2.0 * PI * k as f64 * self.hop_size as f64 / self.window_size as f64)
            .collect()
    }

    /// Number of frames `analyze` produces for `len` samples.
    pub fn frame_count(&self, len: usize) -> usize {
        len / self.hop_size + 1
    }

    /// Windowed FFT of every centred frame, positive frequencies only.
    pub fn analyze(&self, samples: &[f32]) -> Vec<Vec<Complex<f64>>> {
        let pad = self.window_size / 2;
        let num_frames = self.frame_count(samples.len());
        let mut padded = vec![0.0f64; (num_frames - 1) * self.hop_size + self.window_size];
        for (dst, &src) in padded[pad..].iter_mut().zip(samples) {
            *dst = src as f64;
        }

        let bins = self.bins();
        (0..num_frames)
            .map(|frame_idx| {
                let start = frame_idx * self.hop_size;
                let mut buf: Vec<Complex<f64>> = (0..self.window_size)
                    .map(|i| Complex::new(padded[start + i] * self.hann[i], 0.0))
                    .collect();
                self.forward.process(&mut buf);
                buf.truncate(bins);
                buf
            })
            .collect()
    }

    /// Inverse FFT and overlap-add of positive-frequency frames, returning
    /// exactly `len` samples with the centre padding removed.
    pub fn synthesize(&self, frames: &[Vec<Complex<f64>>], len: usize) -> Vec<f64> {
        if frames.is_empty() {
            return vec![0.0; len];
        }

        let bins = self.bins();
        let total = (frames.len() - 1) * self.hop_size + self.window_size;
        let mut output = vec![0.0f64; total];
        let mut window_sum = vec![0.0f64; total];
        // rustfft does not normalize
        let norm = 1.0 / self.window_size as f64;

        let mut buf = vec![Complex::new(0.0, 0.0); self.window_size];
        for (frame_idx, frame) in frames.iter().enumerate() {
            buf[..bins].copy_from_slice(&frame[..bins]);
            // Conjugate symmetry for real output
            for k in 1..bins - 1 {
                buf[self.window_size - k] = buf[k].conj();
            }
            self.inverse.process(&mut buf);

            let start = frame_idx * self.hop_size;
            for i in 0..self.window_size {
                output[start + i] += buf[i].re * norm * self.hann[i];
                window_sum[start + i] += self.hann[i] * self.hann[i];
            }
        }

        let pad = self.window_size / 2;
        (0..len)
            .map(|i| {
                let idx = pad + i;
                if idx < total && window_sum[idx] > 1e-8 {
                    output[idx] / window_sum[idx]
                } else {
                    0.0
                }
            })
            .collect()
    }
}

impl Default for PhaseVocoder {
    fn default() -> Self {
        Self::new(WINDOW_SIZE, HOP_SIZE)
    }
}

/// Wrap a phase value into [-pi, pi].
pub fn wrap_phase(phase: f64) -> f64 {
    phase - (2.0 * PI) * (phase / (2.0 * PI)).round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sine(freq: f64, len: usize, sample_rate: f64) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin() as f32 * 0.5)
            .collect()
    }

    #[test]
    fn test_analysis_synthesis_reconstructs_signal() {
        let vocoder = PhaseVocoder::default();
        let input = sine(440.0, 16000, 16000.0);
        let frames = vocoder.analyze(&input);
        let output = vocoder.synthesize(&frames, input.len());
        assert_eq!(output.len(), input.len());
        for (a, b) in input.iter().zip(output.iter()) {
            assert_abs_diff_eq!(*a as f64, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_short_signal_is_covered() {
        let vocoder = PhaseVocoder::default();
        let input = sine(440.0, 300, 16000.0);
        let frames = vocoder.analyze(&input);
        assert_eq!(frames.len(), vocoder.frame_count(300));
        let output = vocoder.synthesize(&frames, input.len());
        for (a, b) in input.iter().zip(output.iter()) {
            assert_abs_diff_eq!(*a as f64, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_wrap_phase_range() {
        for p in [-10.0, -PI, 0.0, 1.0, PI + 0.5, 25.0] {
            let w = wrap_phase(p);
            assert!((-PI - 1e-12..=PI + 1e-12).contains(&w), "{p} wrapped to {w}");
            assert_abs_diff_eq!((p - w) / (2.0 * PI), ((p - w) / (2.0 * PI)).round(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_synthesize_empty_frames() {
        let vocoder = PhaseVocoder::default();
        assert_eq!(vocoder.synthesize(&[], 10), vec![0.0; 10]);
    }
}
