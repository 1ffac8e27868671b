use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::engine::{EngineHandle, SharedEngine};
use crate::core::voice_profiles::VoiceProfileStore;

/// Shared state handed to every handler.
///
/// The engine is injected by the caller so tests can supply their own
/// implementation; nothing here is global.
pub struct AppState {
    pub config: ServerConfig,
    pub engine: EngineHandle,
    pub voices: VoiceProfileStore,
}

impl AppState {
    pub fn new(config: ServerConfig, engine: SharedEngine) -> Arc<Self> {
        let voices = config.voice_profile_store();
        Arc::new(Self {
            config,
            engine: EngineHandle::new(engine),
            voices,
        })
    }
}
