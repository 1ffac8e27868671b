//! Audio Test Fixtures
//!
//! Programmatically generated reference speech and helpers for reading
//! gateway output back.

use std::f32::consts::PI;
use std::io::Cursor;

use cosyvoice_gateway::core::audio::encode_wav_with_rate;

/// Prompt audio rate expected by the engine
pub const PROMPT_SAMPLE_RATE: u32 = 16000;

/// Generate a sine tone as float samples
pub fn generate_sine(frequency: f32, sample_rate: u32, duration_samples: usize) -> Vec<f32> {
    (0..duration_samples)
        .map(|i| 0.5 * (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// A short mono 16-bit WAV suitable as `prompt_wav`
pub fn prompt_wav(sample_rate: u32, duration_samples: usize) -> Vec<u8> {
    encode_wav_with_rate(&generate_sine(220.0, sample_rate, duration_samples), sample_rate)
        .expect("encode prompt wav")
}

/// A stereo 16-bit WAV, to exercise downmixing
pub fn stereo_wav(sample_rate: u32, frames: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
        for _ in 0..frames {
            writer.write_sample(8192i16).expect("left");
            writer.write_sample(-8192i16).expect("right");
        }
        writer.finalize().expect("finalize");
    }
    cursor.into_inner()
}

/// Parsed WAV response
pub struct DecodedWav {
    pub spec: hound::WavSpec,
    pub samples: Vec<i16>,
}

pub fn decode_wav(bytes: &[u8]) -> DecodedWav {
    let reader = hound::WavReader::new(Cursor::new(bytes)).expect("valid wav");
    let spec = reader.spec();
    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .expect("wav samples");
    DecodedWav { spec, samples }
}

/// Interpret a raw PCM body as little-endian i16 samples
pub fn pcm_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
