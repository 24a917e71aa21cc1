pub mod additive_noise_stage;
pub mod band_pass_stage;
pub mod constant_recognizer;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_audio_reader;
pub mod phase_vocoder;
pub mod pitch_shift_stage;
pub mod pitch_warp_stage;
pub mod resampler;
pub mod time_stretch_stage;
pub mod wav_audio_reader;
pub mod wav_audio_writer;
#[cfg(feature = "whisper")]
pub mod whisper_recognizer;
