/// Rate batch evaluation resamples inputs to unless configured otherwise.
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Minimum audio duration accepted by the anonymization pipeline.
pub const MIN_DURATION_SECONDS: u32 = 1;

pub const DEFAULT_PITCH_SHIFT_SEMITONES: f64 = 4.0;
pub const DEFAULT_TIME_STRETCH_RATE: f64 = 1.0;
pub const TIME_STRETCH_RATE_RANGE: (f64, f64) = (0.25, 4.0);
pub const DEFAULT_NOISE_STDDEV: f64 = 0.01;
pub const DEFAULT_BAND_LOW_HZ: f64 = 300.0;
pub const DEFAULT_BAND_HIGH_HZ: f64 = 3400.0;
pub const DEFAULT_BAND_ORDER: usize = 4;
pub const DEFAULT_VTLN_WARP_RANGE: (f64, f64) = (0.9, 1.1);

/// Chance-level EER reported while no speaker verifier is wired in.
pub const PLACEHOLDER_EER: f64 = 0.5;

/// Transcript the constant recognizer emits for every buffer.
pub const PLACEHOLDER_TRANSCRIPT: &str = "this is a placeholder transcription";

pub const DEFAULT_REPORT_PATH: &str = "evaluation_results.csv";
pub const DEFAULT_SEED: u64 = 42;

/// Suffix appended to the file stem of anonymized outputs.
pub const ANONYMIZED_SUFFIX: &str = "_anon";

pub const CONFIG_DIR_NAME: &str = "VoiceGuard";
pub const CONFIG_FILE_NAME: &str = "pipeline.json";
