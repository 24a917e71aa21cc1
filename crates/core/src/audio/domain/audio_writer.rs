use std::path::Path;

use super::audio_buffer::AudioBuffer;
use super::audio_io_error::AudioIoError;

/// Domain interface for persisting a buffer at its own sample rate.
pub trait AudioWriter: Send {
    fn write_audio(&self, path: &Path, audio: &AudioBuffer) -> Result<(), AudioIoError>;
}
