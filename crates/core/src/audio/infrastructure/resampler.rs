//! Whole-buffer sample rate conversion using rubato.

use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::audio_io_error::AudioIoError;

/// Resample a mono buffer to `target_rate`.
///
/// Returns the buffer unchanged when it is already at the target rate. The
/// output length is `round(len * target / source)`.
pub fn resample(audio: AudioBuffer, target_rate: u32) -> Result<AudioBuffer, AudioIoError> {
    let source_rate = audio.sample_rate();
    if source_rate == target_rate || audio.is_empty() {
        return Ok(AudioBuffer::new(audio.into_samples(), target_rate));
    }

    let err = |reason: String| AudioIoError::Resample {
        from: source_rate,
        to: target_rate,
        reason,
    };
    if source_rate == 0 || target_rate == 0 {
        return Err(err("sample rate must be positive".to_string()));
    }

    log::debug!("Resampling from {source_rate}Hz to {target_rate}Hz");

    let input_frames = audio.len();
    let ratio = target_rate as f64 / source_rate as f64;
    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0,
        PolynomialDegree::Septic,
        input_frames,
        1,
    )
    .map_err(|e| err(e.to_string()))?;

    let delay = resampler.output_delay();
    let planar_input = vec![audio.into_samples()];
    let mut output = resampler
        .process(&planar_input, None)
        .map_err(|e| err(e.to_string()))?
        .pop()
        .unwrap_or_default();
    // Flush the interpolator so the delayed tail is not lost
    let tail = resampler
        .process_partial(None::<&[Vec<f32>]>, None)
        .map_err(|e| err(e.to_string()))?
        .pop()
        .unwrap_or_default();
    output.extend(tail);

    let expected_len = (input_frames as f64 * ratio).round() as usize;
    let mut output = output.split_off(delay.min(output.len()));
    output.resize(expected_len, 0.0);

    Ok(AudioBuffer::new(output, target_rate))
}
