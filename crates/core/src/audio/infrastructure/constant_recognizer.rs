use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::shared::constants::PLACEHOLDER_TRANSCRIPT;

/// Stand-in recognizer that returns the same transcript for every buffer.
#[derive(Debug, Clone)]
pub struct ConstantRecognizer {
    transcript: String,
}

impl ConstantRecognizer {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
        }
    }
}

impl Default for ConstantRecognizer {
    fn default() -> Self {
        Self::new(PLACEHOLDER_TRANSCRIPT)
    }
}

impl SpeechRecognizer for ConstantRecognizer {
    fn transcribe(&self, _: &AudioBuffer) -> Result<String, Box<dyn std::error::Error>> {
        Ok(self.transcript.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_configured_transcript() {
        let recognizer = ConstantRecognizer::new("hello world");
        let audio = AudioBuffer::silence(16000, 16000);
        assert_eq!(recognizer.transcribe(&audio).unwrap(), "hello world");
    }

    #[test]
    fn test_default_is_placeholder() {
        let audio = AudioBuffer::silence(16000, 16000);
        assert_eq!(
            ConstantRecognizer::default().transcribe(&audio).unwrap(),
            PLACEHOLDER_TRANSCRIPT
        );
    }
}
