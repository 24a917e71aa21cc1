pub mod audio_buffer;
pub mod audio_io_error;
pub mod audio_reader;
pub mod audio_writer;
pub mod pipeline_parameters;
pub mod speech_recognizer;
pub mod stage_error;
pub mod transform_result;
pub mod transform_stage;
