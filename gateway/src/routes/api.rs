use axum::{Router, extract::DefaultBodyLimit, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::{inference, voices};
use crate::state::AppState;
use std::sync::Arc;

/// Largest accepted request body (reference audio uploads)
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Create the API router with the synthesis and voice listing routes
///
/// Every synthesis path accepts GET and POST identically.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/inference_sft",
            get(inference::inference_sft).post(inference::inference_sft),
        )
        .route(
            "/inference_zero_shot",
            get(inference::inference_zero_shot).post(inference::inference_zero_shot),
        )
        .route(
            "/inference_zero_shot_wav",
            get(inference::inference_zero_shot_wav).post(inference::inference_zero_shot_wav),
        )
        .route(
            "/inference_with_voice_config",
            get(inference::inference_with_voice_config)
                .post(inference::inference_with_voice_config),
        )
        .route(
            "/inference_cross_lingual",
            get(inference::inference_cross_lingual).post(inference::inference_cross_lingual),
        )
        .route(
            "/inference_instruct",
            get(inference::inference_instruct).post(inference::inference_instruct),
        )
        .route(
            "/inference_instruct2",
            get(inference::inference_instruct2).post(inference::inference_instruct2),
        )
        // Voice listing (also the readiness probe)
        .route("/voices", get(voices::list_voices))
        .route("/speakers", get(voices::list_speakers))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
}
