//! Engine backed by an external model-serving runtime.
//!
//! The runtime hosts the model weights and exposes two calls:
//!
//! - `POST {base}/models/load` with `{"model": "...", "variant": "cosyvoice"}`
//!   answers `{"sample_rate": 22050, "speakers": ["..."]}` once the model is ready,
//!   or a non-2xx status when the model cannot be loaded as that variant.
//! - `POST {base}/synthesize/{mode}` with a multipart form answers a streamed body
//!   of little-endian `f32` samples. Every received frame becomes one chunk.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::base::{
    AudioChunk, AudioChunkStream, EngineError, EngineFactory, EngineResult, EngineVariant,
    InstructTarget, SharedEngine, SynthesisEngine,
};
use crate::core::audio::{PromptSpeech, encode_wav_with_rate};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SAMPLE_WIDTH: usize = std::mem::size_of::<f32>();

/// Connection settings shared by both runtime engine variants.
#[derive(Debug, Clone)]
pub struct RuntimeEngineConfig {
    /// Base URL of the inference runtime, without trailing slash
    pub base_url: String,
    /// Upper bound for a model load or a single synthesis call
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct LoadModelRequest<'a> {
    model: &'a str,
    variant: EngineVariant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub sample_rate: u32,
    #[serde(default)]
    pub speakers: Vec<String>,
}

/// Creates [`RuntimeEngine`]s of one variant.
pub struct RuntimeEngineFactory {
    config: RuntimeEngineConfig,
    variant: EngineVariant,
}

impl RuntimeEngineFactory {
    pub fn new(config: RuntimeEngineConfig, variant: EngineVariant) -> Self {
        Self { config, variant }
    }
}

#[async_trait]
impl EngineFactory for RuntimeEngineFactory {
    fn variant(&self) -> EngineVariant {
        self.variant
    }

    async fn initialize(&self, model_dir: &str) -> EngineResult<SharedEngine> {
        let engine = RuntimeEngine::connect(self.config.clone(), self.variant, model_dir).await?;
        Ok(Arc::new(engine))
    }
}

pub struct RuntimeEngine {
    client: reqwest::Client,
    config: RuntimeEngineConfig,
    variant: EngineVariant,
    info: ModelInfo,
    seed: AtomicU64,
}

impl RuntimeEngine {
    /// Ask the runtime to load `model` as `variant`.
    pub async fn connect(
        config: RuntimeEngineConfig,
        variant: EngineVariant,
        model: &str,
    ) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| EngineError::Initialization(format!("Failed to build HTTP client: {e}")))?;

        let url = format!("{}/models/load", config.base_url);
        let response = client
            .post(&url)
            .json(&LoadModelRequest { model, variant })
            .send()
            .await
            .map_err(|e| EngineError::Initialization(format!("Failed to reach {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Initialization(format!(
                "Runtime refused to load {model} as {variant} ({status}): {body}"
            )));
        }

        let info: ModelInfo = response.json().await.map_err(|e| {
            EngineError::Initialization(format!("Failed to parse model info: {e}"))
        })?;

        info!(
            variant = %variant,
            sample_rate = info.sample_rate,
            speakers = info.speakers.len(),
            "Runtime engine ready"
        );

        Ok(Self {
            client,
            config,
            variant,
            info,
            seed: AtomicU64::new(0),
        })
    }

    fn prompt_part(prompt: &PromptSpeech) -> EngineResult<Part> {
        let wav = encode_wav_with_rate(&prompt.samples, prompt.sample_rate)
            .map_err(|e| EngineError::Synthesis(format!("Failed to encode prompt audio: {e}")))?;
        Part::bytes(wav)
            .file_name("prompt.wav")
            .mime_str("audio/wav")
            .map_err(|e| EngineError::Synthesis(format!("Failed to set MIME type: {e}")))
    }

    async fn invoke(&self, mode: &str, form: Form) -> EngineResult<AudioChunkStream> {
        let seed = self.seed.load(Ordering::SeqCst);
        let form = form.text("seed", seed.to_string());
        let url = format!("{}/synthesize/{mode}", self.config.base_url);

        debug!(variant = %self.variant, mode, seed, "Sending synthesis request to runtime");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EngineError::Connection(format!("Failed to reach {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Synthesis(format!(
                "Runtime returned {status}: {body}"
            )));
        }

        Ok(decode_sample_frames(response.bytes_stream()))
    }
}

#[async_trait]
impl SynthesisEngine for RuntimeEngine {
    fn variant(&self) -> EngineVariant {
        self.variant
    }

    fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }

    fn available_speakers(&self) -> Vec<String> {
        self.info.speakers.clone()
    }

    fn set_seed(&self, seed: u64) {
        self.seed.store(seed, Ordering::SeqCst);
    }

    async fn synthesize_by_speaker(
        &self,
        text: &str,
        speaker_id: &str,
    ) -> EngineResult<AudioChunkStream> {
        let form = Form::new()
            .text("text", text.to_string())
            .text("speaker_id", speaker_id.to_string());
        self.invoke("sft", form).await
    }

    async fn synthesize_zero_shot(
        &self,
        text: &str,
        prompt_text: &str,
        prompt: &PromptSpeech,
    ) -> EngineResult<AudioChunkStream> {
        let form = Form::new()
            .text("text", text.to_string())
            .text("prompt_text", prompt_text.to_string())
            .part("prompt_wav", Self::prompt_part(prompt)?);
        self.invoke("zero_shot", form).await
    }

    async fn synthesize_cross_lingual(
        &self,
        text: &str,
        prompt: &PromptSpeech,
    ) -> EngineResult<AudioChunkStream> {
        let form = Form::new()
            .text("text", text.to_string())
            .part("prompt_wav", Self::prompt_part(prompt)?);
        self.invoke("cross_lingual", form).await
    }

    async fn synthesize_instruct(
        &self,
        text: &str,
        instruct_text: &str,
        target: &InstructTarget,
    ) -> EngineResult<AudioChunkStream> {
        let form = Form::new()
            .text("text", text.to_string())
            .text("instruct_text", instruct_text.to_string());

        match target {
            InstructTarget::Speaker(speaker_id) => {
                if !self.variant.supports_speaker_instruct() {
                    return Err(EngineError::Unsupported {
                        variant: self.variant,
                        mode: "instruct with speaker id".to_string(),
                    });
                }
                self.invoke("instruct", form.text("speaker_id", speaker_id.clone()))
                    .await
            }
            InstructTarget::Prompt(prompt) => {
                if !self.variant.supports_prompt_instruct() {
                    return Err(EngineError::Unsupported {
                        variant: self.variant,
                        mode: "instruct with reference audio".to_string(),
                    });
                }
                self.invoke("instruct2", form.part("prompt_wav", Self::prompt_part(prompt)?))
                    .await
            }
        }
    }
}

/// Turn a byte stream of little-endian `f32` samples into audio chunks.
///
/// Network frames need not align with sample boundaries; a partial sample is
/// carried into the next frame. A dangling partial sample at end of stream is a
/// protocol error.
pub(crate) fn decode_sample_frames<S, E>(frames: S) -> AudioChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut frames = Box::pin(frames);
        let mut carry: Vec<u8> = Vec::new();

        while let Some(frame) = frames.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    yield Err(EngineError::Connection(format!("Audio stream interrupted: {e}")));
                    return;
                }
            };

            carry.extend_from_slice(&frame);
            let complete = carry.len() - carry.len() % SAMPLE_WIDTH;
            if complete == 0 {
                continue;
            }

            let samples: Vec<f32> = carry[..complete]
                .chunks_exact(SAMPLE_WIDTH)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            carry.drain(..complete);

            yield Ok(AudioChunk::new(samples));
        }

        if !carry.is_empty() {
            yield Err(EngineError::Protocol(format!(
                "Audio stream ended mid-sample ({} trailing bytes)",
                carry.len()
            )));
        }
    })
}
