use std::path::Path;

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::audio::domain::audio_io_error::AudioIoError;
use crate::audio::domain::audio_reader::AudioReader;

/// Decodes the best audio stream of any container ffmpeg understands.
///
/// ffmpeg's resampler handles both the mono downmix and the rate
/// conversion; without a target rate the stream's native rate is kept.
pub struct FfmpegAudioReader;

impl AudioReader for FfmpegAudioReader {
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: Option<u32>,
    ) -> Result<AudioBuffer, AudioIoError> {
        decode(path, target_sample_rate).map_err(|e| AudioIoError::UnreadableAudio {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

fn decode(
    path: &Path,
    target_sample_rate: Option<u32>,
) -> Result<AudioBuffer, Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;

    let mut ictx = ffmpeg_next::format::input(path)?;
    let audio_stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .ok_or("no audio stream")?;
    let audio_stream_index = audio_stream.index();

    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())?;
    let mut decoder = codec_ctx.decoder().audio()?;
    let output_rate = target_sample_rate.unwrap_or_else(|| decoder.rate());

    let mut resampler = ffmpeg_next::software::resampling::Context::get(
        decoder.format(),
        decoder.channel_layout(),
        decoder.rate(),
        ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
        ffmpeg_next::ChannelLayout::MONO,
        output_rate,
    )?;

    let mut samples: Vec<f32> = Vec::new();
    let mut decoded = ffmpeg_next::util::frame::audio::Audio::empty();
    let mut resampled = ffmpeg_next::util::frame::audio::Audio::empty();

    for (stream, packet) in ictx.packets() {
        if stream.index() != audio_stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            resampler.run(&decoded, &mut resampled)?;
            extract_f32_samples(&resampled, &mut samples);
        }
    }

    decoder.send_eof()?;
    while decoder.receive_frame(&mut decoded).is_ok() {
        resampler.run(&decoded, &mut resampled)?;
        extract_f32_samples(&resampled, &mut samples);
    }

    // The resampler may still hold buffered samples
    if let Ok(Some(delay)) = resampler.flush(&mut resampled) {
        if delay.output > 0 {
            extract_f32_samples(&resampled, &mut samples);
        }
    }

    Ok(AudioBuffer::new(samples, output_rate))
}

/// Extract f32 samples from a planar mono resampled frame.
fn extract_f32_samples(frame: &ffmpeg_next::util::frame::audio::Audio, out: &mut Vec<f32>) {
    let num_samples = frame.samples();
    if num_samples == 0 {
        return;
    }
    let data = frame.data(0);
    let floats = unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, num_samples) };
    out.extend_from_slice(floats);
}
