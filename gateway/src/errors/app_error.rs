//! HTTP-facing error type for the synthesis gateway.
//!
//! Every failure a handler can surface is funnelled into [`AppError`], which
//! knows its own HTTP status and renders as a small JSON body:
//!
//! ```json
//! { "error": "voice_not_found", "message": "Voice profile not found: narrator" }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Result type for request handling
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Neither the local nor the example voice configuration file exists
    #[error("Voice configuration file not found")]
    ConfigMissing,

    /// The voice configuration file exists but does not match the expected schema
    #[error("Voice configuration file is malformed: {0}")]
    ConfigMalformed(String),

    #[error("Voice profile not found: {0}")]
    VoiceNotFound(String),

    /// Reference audio sample referenced by a profile is not on disk
    #[error("Audio sample not found: {0}")]
    SampleMissing(String),

    /// Missing or malformed request field
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The engine failed while producing audio. Carries a caller-safe message only.
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailure(String),

    /// No engine variant could be initialized. Only raised during startup.
    #[error("Engine initialization failed: {0}")]
    EngineInit(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ConfigMissing | AppError::VoiceNotFound(_) | AppError::SampleMissing(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigMalformed(_)
            | AppError::SynthesisFailure(_)
            | AppError::EngineInit(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ConfigMissing => "config_missing",
            AppError::ConfigMalformed(_) => "config_malformed",
            AppError::VoiceNotFound(_) => "voice_not_found",
            AppError::SampleMissing(_) => "sample_missing",
            AppError::Validation(_) => "validation_error",
            AppError::SynthesisFailure(_) => "synthesis_failure",
            AppError::EngineInit(_) => "engine_init_failure",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(json!({
                "error": self.kind(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
