use std::io::Cursor;

use futures::StreamExt;

use super::AudioResult;
use super::pcm::sample_to_i16;
use crate::core::engine::{AudioChunkStream, EngineResult};

/// Sample rate written into every WAV response header.
///
/// This describes the synthesized output and is independent of the 16 kHz rate
/// used for reference audio.
pub const WAV_OUTPUT_SAMPLE_RATE: u32 = 22050;

/// Encode samples as a mono 16-bit WAV at [`WAV_OUTPUT_SAMPLE_RATE`].
///
/// An empty slice yields a well-formed container with a zero-length data chunk.
pub fn encode_wav(samples: &[f32]) -> AudioResult<Vec<u8>> {
    encode_wav_with_rate(samples, WAV_OUTPUT_SAMPLE_RATE)
}

/// Encode samples as a mono 16-bit WAV at an arbitrary sample rate.
pub fn encode_wav_with_rate(samples: &[f32], sample_rate: u32) -> AudioResult<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample_to_i16(sample))?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Drain a chunk stream into one contiguous sample buffer, preserving order.
pub async fn collect_samples(mut chunks: AudioChunkStream) -> EngineResult<Vec<f32>> {
    let mut samples = Vec::new();
    while let Some(chunk) = chunks.next().await {
        samples.extend_from_slice(chunk?.samples());
    }
    Ok(samples)
}

/// Outcome of the fully buffered renderer.
#[derive(Debug)]
pub struct RenderedWav {
    pub bytes: Vec<u8>,
    pub sample_count: usize,
}

/// Consume the whole chunk stream and wrap it in a WAV container.
///
/// Engine errors are returned as-is; encoding errors are folded into the outer
/// result so the caller can map both to a synthesis failure.
pub async fn render_wav(chunks: AudioChunkStream) -> EngineResult<AudioResult<RenderedWav>> {
    let samples = collect_samples(chunks).await?;
    let sample_count = samples.len();
    Ok(encode_wav(&samples).map(|bytes| RenderedWav {
        bytes,
        sample_count,
    }))
}
