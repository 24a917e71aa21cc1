use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::audio_io_error::AudioIoError;
use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::infrastructure::resampler::resample;

/// Decodes WAV files with hound, downmixing to mono.
pub struct WavAudioReader;

impl AudioReader for WavAudioReader {
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: Option<u32>,
    ) -> Result<AudioBuffer, AudioIoError> {
        let unreadable = |reason: String| AudioIoError::UnreadableAudio {
            path: path.to_path_buf(),
            reason,
        };

        let mut reader = WavReader::open(path).map_err(|e| unreadable(e.to_string()))?;
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(AudioIoError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "zero channels".to_string(),
            });
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| unreadable(e.to_string()))?,
            SampleFormat::Int => {
                if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                    return Err(AudioIoError::UnsupportedFormat {
                        path: path.to_path_buf(),
                        reason: format!("{}-bit integer PCM", spec.bits_per_sample),
                    });
                }
                let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| unreadable(e.to_string()))?
            }
        };

        let mono = downmix(&interleaved, spec.channels as usize);
        log::debug!(
            "Read {} ({} Hz, {} ch, {} frames)",
            path.display(),
            spec.sample_rate,
            spec.channels,
            mono.len()
        );

        let audio = AudioBuffer::new(mono, spec.sample_rate);
        match target_sample_rate {
            Some(rate) => resample(audio, rate),
            None => Ok(audio),
        }
    }
}

/// Average interleaved channels into one.
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
