use super::audio_buffer::AudioBuffer;

/// Domain interface for speech-to-text transcription.
///
/// Implementations return the plain hypothesis transcript for the buffer.
pub trait SpeechRecognizer: Send {
    fn transcribe(&self, audio: &AudioBuffer) -> Result<String, Box<dyn std::error::Error>>;
}
