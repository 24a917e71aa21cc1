use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use voiceguard_core::audio::domain::audio_reader::AudioReader;
use voiceguard_core::audio::domain::audio_writer::AudioWriter;
use voiceguard_core::audio::domain::pipeline_parameters::PipelineParameters;
use voiceguard_core::audio::domain::speech_recognizer::SpeechRecognizer;
use voiceguard_core::audio::infrastructure::constant_recognizer::ConstantRecognizer;
use voiceguard_core::audio::infrastructure::wav_audio_writer::WavAudioWriter;
use voiceguard_core::evaluation::domain::equal_error_rate::PlaceholderEerEstimator;
use voiceguard_core::evaluation::domain::evaluation_record::BatchSummary;
use voiceguard_core::evaluation::domain::word_error_rate::word_error_breakdown;
use voiceguard_core::evaluation::infrastructure::report_writer_factory::create_report_writer;
use voiceguard_core::pipeline::anonymization_pipeline::AnonymizationPipeline;
use voiceguard_core::pipeline::batch_manifest::load_manifest;
use voiceguard_core::pipeline::batch_runner::BatchRunner;
use voiceguard_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use voiceguard_core::shared::config::load_parameters;
use voiceguard_core::shared::constants::{
    DEFAULT_REPORT_PATH, DEFAULT_SEED, PLACEHOLDER_TRANSCRIPT, TARGET_SAMPLE_RATE,
};

/// Voice anonymization and privacy/utility evaluation.
#[derive(Parser)]
#[command(name = "voiceguard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Anonymize a single audio file.
    Anonymize(AnonymizeArgs),
    /// Anonymize and score every file listed in a JSON manifest.
    Evaluate(EvaluateArgs),
    /// Print the word error rate between two transcripts.
    Wer {
        reference: String,
        hypothesis: String,
    },
}

/// Options shared by commands that run the pipeline.
#[derive(Args)]
struct PipelineArgs {
    /// Base seed for the random stages.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Parameter file (JSON). Defaults to the user config file if present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resample input to this rate before processing. `anonymize` keeps the
    /// native rate by default; `evaluate` uses 16 kHz.
    #[arg(long)]
    sample_rate: Option<u32>,
}

#[derive(Args)]
struct AnonymizeArgs {
    /// Input audio file.
    input: PathBuf,

    /// Output WAV file.
    output: PathBuf,

    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Pitch shift in semitones.
    #[arg(long, allow_negative_numbers = true)]
    pitch_shift: Option<f64>,

    /// Standard deviation of the added Gaussian noise.
    #[arg(long)]
    noise_stddev: Option<f64>,

    /// Time-stretch rate (>1 speeds up).
    #[arg(long)]
    time_stretch: Option<f64>,

    /// Band-pass lower edge in Hz.
    #[arg(long)]
    band_low: Option<f64>,

    /// Band-pass upper edge in Hz.
    #[arg(long)]
    band_high: Option<f64>,

    /// Skip the band-pass stage.
    #[arg(long)]
    no_band_pass: bool,

    /// Skip the random pitch warp stage.
    #[arg(long)]
    no_pitch_warp: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// JSON manifest of `{ "path", "transcript" }` entries.
    manifest: PathBuf,

    /// Report file; `.json` writes JSON, anything else CSV.
    #[arg(long, default_value = DEFAULT_REPORT_PATH)]
    report: PathBuf,

    /// Directory for anonymized audio (`<stem>_anon.wav`).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Transcript returned by the stand-in recognizer.
    #[arg(long, default_value = PLACEHOLDER_TRANSCRIPT)]
    transcript: String,

    /// Whisper model file used instead of the stand-in. Expects 16 kHz input.
    #[cfg(feature = "whisper")]
    #[arg(long)]
    whisper_model: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Anonymize(args) => run_anonymize(args),
        Command::Evaluate(args) => run_evaluate(args),
        Command::Wer {
            reference,
            hypothesis,
        } => run_wer(&reference, &hypothesis),
    }
}

fn run_anonymize(args: AnonymizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate_input(&args.input)?;
    let params = anonymize_parameters(&args)?;
    let pipeline = AnonymizationPipeline::from_parameters(&params);
    log::info!("Stages: {}", pipeline.stage_names().join(" -> "));

    let audio = open_reader().read_audio(&args.input, args.pipeline.sample_rate)?;
    let mut rng = StdRng::seed_from_u64(args.pipeline.seed);
    let result = pipeline.anonymize(&audio, &mut rng)?;
    for report in result.fallbacks() {
        if let Some(error) = &report.error {
            log::warn!("{} passed audio through unchanged: {error}", report.stage);
        }
    }

    WavAudioWriter.write_audio(&args.output, &result.audio)?;
    log::info!("Output written to {}", args.output.display());
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate_input(&args.manifest)?;
    if let Some(dir) = &args.output_dir {
        if !dir.is_dir() {
            return Err(format!("Output directory not found: {}", dir.display()).into());
        }
    }

    let params = load_parameters(args.pipeline.config.as_deref())?;
    let items = load_manifest(&args.manifest)?;
    log::info!("Loaded {} items from {}", items.len(), args.manifest.display());

    let mut runner = BatchRunner::new(
        open_reader(),
        build_recognizer(&args)?,
        Box::new(PlaceholderEerEstimator::default()),
        AnonymizationPipeline::from_parameters(&params),
    )
    .with_logger(Box::new(StdoutPipelineLogger::default()))
    .with_target_sample_rate(Some(evaluation_sample_rate(args.pipeline.sample_rate)))
    .with_seed(args.pipeline.seed);
    if let Some(dir) = &args.output_dir {
        runner = runner.with_output(Box::new(WavAudioWriter), dir);
    }

    let records = runner.run(&items);
    create_report_writer(&args.report).write_report(&args.report, &records)?;
    log::info!("Report written to {}", args.report.display());
    println!("{}", BatchSummary::from_records(&records));
    Ok(())
}

fn run_wer(reference: &str, hypothesis: &str) -> Result<(), Box<dyn std::error::Error>> {
    let breakdown = word_error_breakdown(reference, hypothesis)?;
    println!("WER: {:.4}", breakdown.rate());
    println!(
        "hits {}, substitutions {}, deletions {}, insertions {}",
        breakdown.hits, breakdown.substitutions, breakdown.deletions, breakdown.insertions
    );
    Ok(())
}

/// Config file first, then command-line overrides.
fn anonymize_parameters(
    args: &AnonymizeArgs,
) -> Result<PipelineParameters, Box<dyn std::error::Error>> {
    let mut params = load_parameters(args.pipeline.config.as_deref())?;
    if let Some(v) = args.pitch_shift {
        params.pitch_shift_semitones = v;
    }
    if let Some(v) = args.noise_stddev {
        params.noise_stddev = v;
    }
    if let Some(v) = args.time_stretch {
        params.time_stretch_rate = v;
    }
    if let Some(v) = args.band_low {
        params.band_low_hz = v;
    }
    if let Some(v) = args.band_high {
        params.band_high_hz = v;
    }
    if args.no_band_pass {
        params.stages.band_pass = false;
    }
    if args.no_pitch_warp {
        params.stages.pitch_warp = false;
    }
    params.validate()?;
    Ok(params)
}

/// Evaluation input rate: 16 kHz unless `--sample-rate` is given.
fn evaluation_sample_rate(requested: Option<u32>) -> u32 {
    requested.unwrap_or(TARGET_SAMPLE_RATE)
}

fn validate_input(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Input file not found: {}", path.display()).into());
    }
    Ok(())
}

#[cfg(feature = "ffmpeg")]
fn open_reader() -> Box<dyn AudioReader> {
    Box::new(voiceguard_core::audio::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader)
}

#[cfg(not(feature = "ffmpeg"))]
fn open_reader() -> Box<dyn AudioReader> {
    Box::new(voiceguard_core::audio::infrastructure::wav_audio_reader::WavAudioReader)
}

#[cfg(feature = "whisper")]
fn build_recognizer(
    args: &EvaluateArgs,
) -> Result<Box<dyn SpeechRecognizer>, Box<dyn std::error::Error>> {
    use voiceguard_core::audio::infrastructure::whisper_recognizer::WhisperRecognizer;

    match &args.whisper_model {
        Some(model) => {
            log::info!("Loading whisper model {}", model.display());
            Ok(Box::new(WhisperRecognizer::new(model, "en")?))
        }
        None => Ok(Box::new(ConstantRecognizer::new(args.transcript.clone()))),
    }
}

#[cfg(not(feature = "whisper"))]
fn build_recognizer(
    args: &EvaluateArgs,
) -> Result<Box<dyn SpeechRecognizer>, Box<dyn std::error::Error>> {
    Ok(Box::new(ConstantRecognizer::new(args.transcript.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_defaults_to_16k() {
        assert_eq!(evaluation_sample_rate(None), 16000);
        assert_eq!(evaluation_sample_rate(Some(8000)), 8000);
    }

    #[test]
    fn test_evaluate_args_parse_without_sample_rate() {
        let cli = Cli::try_parse_from(["voiceguard", "evaluate", "manifest.json"]).unwrap();
        let Command::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(args.pipeline.sample_rate, None);
        assert_eq!(evaluation_sample_rate(args.pipeline.sample_rate), TARGET_SAMPLE_RATE);
        assert_eq!(args.report, PathBuf::from(DEFAULT_REPORT_PATH));
    }
}
