use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::audio_io_error::AudioIoError;
use crate::audio::domain::audio_writer::AudioWriter;

/// Writes mono 32-bit float WAV files at the buffer's sample rate.
pub struct WavAudioWriter;

impl AudioWriter for WavAudioWriter {
    fn write_audio(&self, path: &Path, audio: &AudioBuffer) -> Result<(), AudioIoError> {
        let write_err = |e: hound::Error| AudioIoError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let spec = WavSpec {
            channels: 1,
            sample_rate: audio.sample_rate(),
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(path, spec).map_err(write_err)?;
        for &sample in audio.samples() {
            writer.write_sample(sample).map_err(write_err)?;
        }
        writer.finalize().map_err(write_err)?;

        log::debug!("Wrote {} samples to {}", audio.len(), path.display());
        Ok(())
    }
}
