//! In-process synthesis engine for router tests.
//!
//! Output is a deterministic function of the current seed and the input text,
//! so seeded requests are reproducible byte for byte.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;

use cosyvoice_gateway::core::audio::PromptSpeech;
use cosyvoice_gateway::core::engine::{
    AudioChunk, AudioChunkStream, EngineError, EngineResult, EngineVariant, InstructTarget,
    SynthesisEngine,
};

/// Sizes of the chunks produced for one request
pub const CHUNK_SIZES: [usize; 3] = [160, 80, 240];
pub const TOTAL_SAMPLES: usize = 480;
pub const MOCK_SAMPLE_RATE: u32 = 24000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Three chunks of deterministic audio
    Normal,
    /// A stream that ends without producing a chunk
    Empty,
    /// Refuse to start synthesis
    FailImmediately,
    /// One chunk, then an error
    FailMidStream,
    /// Never ends on its own
    Endless,
}

/// One engine call as observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub mode: &'static str,
    pub text: String,
    pub seed: u64,
    pub speaker_id: Option<String>,
    pub prompt_text: Option<String>,
    pub instruct_text: Option<String>,
    pub prompt_samples: Option<usize>,
}

pub struct MockEngine {
    variant: EngineVariant,
    behavior: Mutex<MockBehavior>,
    seed: Mutex<u64>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockEngine {
    pub fn new(variant: EngineVariant) -> Self {
        Self {
            variant,
            behavior: Mutex::new(MockBehavior::Normal),
            seed: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().last().cloned()
    }

    /// The samples `Normal` mode produces for this seed and text
    pub fn expected_samples(seed: u64, text: &str) -> Vec<f32> {
        let mut state = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(text.len() as u64 + 1442695040888963407);
        (0..TOTAL_SAMPLES)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let unit = (state >> 40) as f32 / (1u64 << 24) as f32;
                unit - 0.5
            })
            .collect()
    }

    fn produce(&self, call: RecordedCall) -> EngineResult<AudioChunkStream> {
        let samples = Self::expected_samples(call.seed, &call.text);
        self.calls.lock().push(call);

        match *self.behavior.lock() {
            MockBehavior::Normal => {
                let mut chunks = Vec::new();
                let mut offset = 0;
                for size in CHUNK_SIZES {
                    chunks.push(Ok(AudioChunk::new(samples[offset..offset + size].to_vec())));
                    offset += size;
                }
                Ok(Box::pin(futures::stream::iter(chunks)))
            }
            MockBehavior::Empty => Ok(Box::pin(futures::stream::empty())),
            MockBehavior::FailImmediately => Err(EngineError::Synthesis(
                "CUDA out of memory at layer 17".to_string(),
            )),
            MockBehavior::FailMidStream => Ok(Box::pin(futures::stream::iter(vec![
                Ok(AudioChunk::new(samples[..CHUNK_SIZES[0]].to_vec())),
                Err(EngineError::Synthesis("vocoder crashed".to_string())),
            ]))),
            MockBehavior::Endless => Ok(Box::pin(
                futures::stream::repeat_with(|| Ok(AudioChunk::new(vec![0.1; 64])))
                    .then(|chunk| async move {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                        chunk
                    }),
            )),
        }
    }

    fn call(&self, mode: &'static str, text: &str) -> RecordedCall {
        RecordedCall {
            mode,
            text: text.to_string(),
            seed: *self.seed.lock(),
            speaker_id: None,
            prompt_text: None,
            instruct_text: None,
            prompt_samples: None,
        }
    }
}

#[async_trait]
impl SynthesisEngine for MockEngine {
    fn variant(&self) -> EngineVariant {
        self.variant
    }

    fn sample_rate(&self) -> u32 {
        MOCK_SAMPLE_RATE
    }

    fn available_speakers(&self) -> Vec<String> {
        vec!["中文女".to_string(), "英文男".to_string()]
    }

    fn set_seed(&self, seed: u64) {
        *self.seed.lock() = seed;
    }

    async fn synthesize_by_speaker(
        &self,
        text: &str,
        speaker_id: &str,
    ) -> EngineResult<AudioChunkStream> {
        let mut call = self.call("sft", text);
        call.speaker_id = Some(speaker_id.to_string());
        self.produce(call)
    }

    async fn synthesize_zero_shot(
        &self,
        text: &str,
        prompt_text: &str,
        prompt: &PromptSpeech,
    ) -> EngineResult<AudioChunkStream> {
        let mut call = self.call("zero_shot", text);
        call.prompt_text = Some(prompt_text.to_string());
        call.prompt_samples = Some(prompt.samples.len());
        self.produce(call)
    }

    async fn synthesize_cross_lingual(
        &self,
        text: &str,
        prompt: &PromptSpeech,
    ) -> EngineResult<AudioChunkStream> {
        let mut call = self.call("cross_lingual", text);
        call.prompt_samples = Some(prompt.samples.len());
        self.produce(call)
    }

    async fn synthesize_instruct(
        &self,
        text: &str,
        instruct_text: &str,
        target: &InstructTarget,
    ) -> EngineResult<AudioChunkStream> {
        let mut call = match target {
            InstructTarget::Speaker(speaker_id) => {
                if !self.variant.supports_speaker_instruct() {
                    return Err(EngineError::Unsupported {
                        variant: self.variant,
                        mode: "instruct".to_string(),
                    });
                }
                let mut call = self.call("instruct", text);
                call.speaker_id = Some(speaker_id.clone());
                call
            }
            InstructTarget::Prompt(prompt) => {
                if !self.variant.supports_prompt_instruct() {
                    return Err(EngineError::Unsupported {
                        variant: self.variant,
                        mode: "instruct2".to_string(),
                    });
                }
                let mut call = self.call("instruct2", text);
                call.prompt_samples = Some(prompt.samples.len());
                call
            }
        };
        call.instruct_text = Some(instruct_text.to_string());
        self.produce(call)
    }
}
