pub mod audio;
pub mod engine;
pub mod synthesis;
pub mod voice_profiles;

// Re-export commonly used types for convenience
pub use audio::{AudioError, AudioResult, PromptSpeech};
pub use engine::{
    AudioChunk, AudioChunkStream, EngineError, EngineFactory, EngineHandle, EngineResult,
    EngineVariant, InstructTarget, SharedEngine, SynthesisEngine, load_engine, runtime_factories,
};
pub use synthesis::{Conditioning, JobContext, SynthesisJob, SynthesisMode};
pub use voice_profiles::{VoiceConfigFile, VoiceProfile, VoiceProfileStore};
