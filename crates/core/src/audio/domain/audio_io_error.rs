use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioIoError {
    #[error("unreadable audio {path}: {reason}")]
    UnreadableAudio { path: PathBuf, reason: String },

    #[error("unsupported audio format in {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("resampling {from} Hz -> {to} Hz failed: {reason}")]
    Resample { from: u32, to: u32, reason: String },

    #[error("failed to write audio to {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}
