use std::path::Path;

use super::audio_buffer::AudioBuffer;
use super::audio_io_error::AudioIoError;

/// Domain interface for decoding an audio file into a mono buffer.
pub trait AudioReader: Send {
    /// Decode `path` to mono PCM. With `target_sample_rate` set the result is
    /// resampled to that rate; otherwise the native rate is kept.
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: Option<u32>,
    ) -> Result<AudioBuffer, AudioIoError>;
}
