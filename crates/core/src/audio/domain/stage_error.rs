use thiserror::Error;

/// A failure local to one transform stage.
///
/// Stage errors never cross the pipeline boundary: the pipeline records them
/// and substitutes the stage input as its output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error(
        "invalid band-pass {low_hz}-{high_hz} Hz (order {order}) for sample rate {sample_rate} Hz"
    )]
    InvalidFilter {
        low_hz: f64,
        high_hz: f64,
        order: usize,
        sample_rate: u32,
    },

    #[error("signal of {len} samples is too short, need more than {required}")]
    SignalTooShort { len: usize, required: usize },

    #[error("numerical failure: {0}")]
    Numerical(String),
}
