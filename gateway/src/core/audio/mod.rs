//! Audio conversion for the synthesis gateway.
//!
//! - `pcm` - float to signed 16-bit conversion and the streamed PCM renderer
//! - `wav` - WAV container encoding and the fully buffered renderer
//! - `decode` - decoding uploaded reference audio into 16 kHz mono samples

pub mod decode;
pub mod pcm;
pub mod wav;

use thiserror::Error;

pub use decode::{PROMPT_SAMPLE_RATE, decode_prompt_speech, load_prompt_speech_file, resample_linear};
pub use pcm::{PCM16_SCALE, encode_pcm16_le, sample_to_i16, stream_pcm};
pub use wav::{
    RenderedWav, WAV_OUTPUT_SAMPLE_RATE, collect_samples, encode_wav, encode_wav_with_rate, render_wav,
};

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("WAV codec error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Failed to read audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported audio: {0}")]
    Unsupported(String),
}

pub type AudioResult<T> = Result<T, AudioError>;

/// Mono reference speech used to condition zero-shot, cross-lingual and
/// instruct synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpeech {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl PromptSpeech {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}
