use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::core::engine::EngineVariant;
use crate::core::voice_profiles::VoiceConfigFile;
use crate::errors::AppResult;
use crate::state::AppState;

/// Speakers built into the loaded engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeakersResponse {
    pub variant: EngineVariant,
    pub sample_rate: u32,
    pub speakers: Vec<String>,
}

/// Return the authoritative voice configuration document as parsed.
///
/// Re-read on every call, so this doubles as the readiness probe: it only
/// answers 200 once the process is serving and its voice config is sound.
pub async fn list_voices(State(state): State<Arc<AppState>>) -> AppResult<Json<VoiceConfigFile>> {
    let config = state.voices.load()?;
    debug!(count = config.voices.len(), "Listing voice profiles");
    Ok(Json(config))
}

/// List the speaker ids accepted by `spk_id`
pub async fn list_speakers(State(state): State<Arc<AppState>>) -> Json<SpeakersResponse> {
    let engine = state.engine.engine();
    Json(SpeakersResponse {
        variant: engine.variant(),
        sample_rate: engine.sample_rate(),
        speakers: engine.available_speakers(),
    })
}
