//! Base traits and types for speech synthesis engines.
//!
//! An engine maps text plus optional conditioning (a preset speaker, reference
//! speech, an instruction) to a lazy, finite, single-pass stream of audio chunks.
//! Engines are shared across requests behind an `Arc<dyn SynthesisEngine>`.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::audio::PromptSpeech;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be brought up for the requested model
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// The loaded engine variant has no support for the requested mode
    #[error("Unsupported by {variant}: {mode}")]
    Unsupported {
        variant: EngineVariant,
        mode: String,
    },

    /// Could not reach the inference runtime
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The engine faulted while producing audio
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    /// The runtime answered with data we could not interpret
    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Audio Types
// =============================================================================

/// One unit of engine output: mono float samples in [-1.0, 1.0].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioChunk {
    samples: Vec<f32>,
}

impl AudioChunk {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// Lazy, single-pass sequence of chunks produced by one synthesis call.
pub type AudioChunkStream = Pin<Box<dyn Stream<Item = EngineResult<AudioChunk>> + Send>>;

// =============================================================================
// Engine Variants
// =============================================================================

/// The two engine generations a model directory can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineVariant {
    CosyVoice,
    CosyVoice2,
}

impl EngineVariant {
    /// Initialization order used at startup
    pub const FALLBACK_ORDER: [EngineVariant; 2] = [EngineVariant::CosyVoice, EngineVariant::CosyVoice2];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineVariant::CosyVoice => "cosyvoice",
            EngineVariant::CosyVoice2 => "cosyvoice2",
        }
    }

    /// Instruction synthesis conditioned on a preset speaker id
    pub fn supports_speaker_instruct(&self) -> bool {
        matches!(self, EngineVariant::CosyVoice)
    }

    /// Instruction synthesis conditioned on reference speech
    pub fn supports_prompt_instruct(&self) -> bool {
        matches!(self, EngineVariant::CosyVoice2)
    }
}

impl fmt::Display for EngineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an instruction-guided synthesis is conditioned on.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructTarget {
    Speaker(String),
    Prompt(PromptSpeech),
}

// =============================================================================
// Engine Trait
// =============================================================================

#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    fn variant(&self) -> EngineVariant;

    /// Native output sample rate of the streamed PCM
    fn sample_rate(&self) -> u32;

    /// Preset speaker ids accepted by [`SynthesisEngine::synthesize_by_speaker`]
    fn available_speakers(&self) -> Vec<String>;

    /// Seed every random source used by subsequent synthesis calls.
    fn set_seed(&self, seed: u64);

    async fn synthesize_by_speaker(
        &self,
        text: &str,
        speaker_id: &str,
    ) -> EngineResult<AudioChunkStream>;

    async fn synthesize_zero_shot(
        &self,
        text: &str,
        prompt_text: &str,
        prompt: &PromptSpeech,
    ) -> EngineResult<AudioChunkStream>;

    async fn synthesize_cross_lingual(
        &self,
        text: &str,
        prompt: &PromptSpeech,
    ) -> EngineResult<AudioChunkStream>;

    async fn synthesize_instruct(
        &self,
        text: &str,
        instruct_text: &str,
        target: &InstructTarget,
    ) -> EngineResult<AudioChunkStream>;
}

pub type SharedEngine = Arc<dyn SynthesisEngine>;

/// Builds an engine of one variant for a model location.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    fn variant(&self) -> EngineVariant;

    async fn initialize(&self, model_dir: &str) -> EngineResult<SharedEngine>;
}
