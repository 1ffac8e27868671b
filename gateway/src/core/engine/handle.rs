use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::Semaphore;
use tracing::debug;

use super::base::{AudioChunkStream, EngineError, EngineResult, SharedEngine};
use crate::core::synthesis::{Conditioning, SynthesisJob};

/// Shared, single-flight access to the loaded engine.
///
/// The engine is not assumed to tolerate concurrent invocation, and seeding is
/// engine-global state. A job therefore holds the gate from the moment its seed
/// is applied until its chunk stream is exhausted or dropped. Waiting jobs are
/// admitted in FIFO order.
#[derive(Clone)]
pub struct EngineHandle {
    engine: SharedEngine,
    gate: Arc<Semaphore>,
}

impl EngineHandle {
    pub fn new(engine: SharedEngine) -> Self {
        Self {
            engine,
            gate: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    /// Number of jobs that could start right now without waiting
    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }

    /// Seed the engine if the job carries a seed, then dispatch it to the engine
    /// method matching its conditioning.
    pub async fn run(&self, job: &SynthesisJob) -> EngineResult<AudioChunkStream> {
        let permit = self
            .gate
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EngineError::Synthesis("engine gate closed".to_string()))?;

        if let Some(seed) = job.seed {
            self.engine.set_seed(seed);
        }

        debug!(context = %job.context(), "Dispatching job to engine");

        let engine = &self.engine;
        let text = job.text.as_str();
        let chunks = match &job.conditioning {
            Conditioning::Speaker { speaker_id } => {
                engine.synthesize_by_speaker(text, speaker_id).await?
            }
            Conditioning::ZeroShot {
                prompt_text,
                prompt,
            } => engine.synthesize_zero_shot(text, prompt_text, prompt).await?,
            Conditioning::CrossLingual { prompt } => {
                engine.synthesize_cross_lingual(text, prompt).await?
            }
            Conditioning::Instruct {
                instruct_text,
                target,
            } => engine.synthesize_instruct(text, instruct_text, target).await?,
        };

        Ok(Box::pin(async_stream::stream! {
            let _permit = permit;
            let mut chunks = chunks;
            while let Some(chunk) = chunks.next().await {
                yield chunk;
            }
        }))
    }
}
