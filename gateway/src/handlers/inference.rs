//! Synthesis endpoints.
//!
//! Each handler validates its form, builds a [`SynthesisJob`] and hands it to
//! the shared engine. Streaming modes answer with raw s16le PCM at the engine's
//! native rate; the `_wav` and voice-profile modes buffer the whole utterance
//! and answer with a WAV file.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::core::audio::{render_wav, stream_pcm};
use crate::core::engine::{EngineError, InstructTarget};
use crate::core::synthesis::{Conditioning, JobContext, SynthesisJob};
use crate::errors::{AppError, AppResult};
use crate::handlers::form::SynthesisForm;
use crate::state::AppState;

/// Header carrying the sample rate of a raw PCM stream
pub const SAMPLE_RATE_HEADER: &str = "x-sample-rate";

const DEFAULT_WAV_FILENAME: &str = "output.wav";

/// Log the engine's reason and return a caller-safe failure.
fn synthesis_failure(context: &JobContext, err: EngineError) -> AppError {
    error!(%context, error = %err, "Speech synthesis failed");
    match err {
        EngineError::Unsupported { .. } => AppError::SynthesisFailure(err.to_string()),
        _ => AppError::SynthesisFailure("the engine could not synthesize this request".to_string()),
    }
}

async fn stream_response(state: &AppState, job: SynthesisJob) -> AppResult<Response> {
    let context = job.context();
    let chunks = state
        .engine
        .run(&job)
        .await
        .map_err(|e| synthesis_failure(&context, e))?;

    let sample_rate = state.engine.engine().sample_rate();
    let body = Body::from_stream(stream_pcm(
        chunks,
        state.config.stream_buffer_chunks,
        state.config.stream_stall_timeout(),
        context,
    ));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (
                header::HeaderName::from_static(SAMPLE_RATE_HEADER),
                HeaderValue::from(sample_rate),
            ),
        ],
        body,
    )
        .into_response())
}

async fn wav_response(state: &AppState, job: SynthesisJob, filename: &str) -> AppResult<Response> {
    let context = job.context();
    let chunks = state
        .engine
        .run(&job)
        .await
        .map_err(|e| synthesis_failure(&context, e))?;

    let rendered = render_wav(chunks)
        .await
        .map_err(|e| synthesis_failure(&context, e))?
        .map_err(|e| {
            error!(%context, error = %e, "Failed to encode WAV output");
            AppError::SynthesisFailure("failed to encode audio".to_string())
        })?;

    info!(%context, samples = rendered.sample_count, "WAV synthesis complete");

    let disposition = HeaderValue::from_str(&format!("attachment; filename={filename}"))
        .unwrap_or_else(|_| {
            HeaderValue::from_static("attachment; filename=output.wav")
        });

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("audio/wav")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rendered.bytes,
    )
        .into_response())
}

/// Synthesize with one of the engine's built-in speakers
pub async fn inference_sft(
    State(state): State<Arc<AppState>>,
    form: SynthesisForm,
) -> AppResult<Response> {
    let text = form.text("tts_text")?;
    let speaker_id = form.text("spk_id")?;

    let job = SynthesisJob::new(text, Conditioning::Speaker { speaker_id });
    stream_response(&state, job).await
}

fn zero_shot_job(form: &SynthesisForm) -> AppResult<SynthesisJob> {
    let text = form.text("tts_text")?;
    let prompt_text = form.text("prompt_text")?;
    let prompt = form.prompt_speech("prompt_wav")?;
    let seed = form.seed()?;

    info!(seed, "Zero-shot synthesis requested");

    Ok(SynthesisJob::new(text, Conditioning::ZeroShot { prompt_text, prompt }).with_seed(seed))
}

/// Clone the voice in `prompt_wav`, streaming raw PCM
pub async fn inference_zero_shot(
    State(state): State<Arc<AppState>>,
    form: SynthesisForm,
) -> AppResult<Response> {
    let job = zero_shot_job(&form)?;
    stream_response(&state, job).await
}

/// Clone the voice in `prompt_wav`, returning a WAV file
pub async fn inference_zero_shot_wav(
    State(state): State<Arc<AppState>>,
    form: SynthesisForm,
) -> AppResult<Response> {
    let job = zero_shot_job(&form)?;
    wav_response(&state, job, DEFAULT_WAV_FILENAME).await
}

/// Synthesize with a named voice profile from the voice configuration
///
/// The profile supplies the reference sample, its transcript and the seed.
pub async fn inference_with_voice_config(
    State(state): State<Arc<AppState>>,
    form: SynthesisForm,
) -> AppResult<Response> {
    let text = form.text("tts_text")?;
    let voice_id = form.text("voice_id")?;

    let profile = state.voices.resolve(&voice_id)?;
    let seed = profile.synthesis_seed()?;
    let prompt = state.voices.resolve_audio_sample(&profile.audio_file)?;

    info!(
        voice_id = %profile.id,
        voice = %profile.name,
        seed,
        "Using voice profile"
    );

    let job = SynthesisJob::new(
        text,
        Conditioning::ZeroShot {
            prompt_text: profile.prompt_text,
            prompt,
        },
    )
    .with_seed(seed)
    .with_voice(profile.name);

    wav_response(&state, job, &format!("{voice_id}_output.wav")).await
}

/// Speak `tts_text` in the language of the text using the voice in `prompt_wav`
pub async fn inference_cross_lingual(
    State(state): State<Arc<AppState>>,
    form: SynthesisForm,
) -> AppResult<Response> {
    let text = form.text("tts_text")?;
    let prompt = form.prompt_speech("prompt_wav")?;

    let job = SynthesisJob::new(text, Conditioning::CrossLingual { prompt });
    stream_response(&state, job).await
}

/// Instruction-guided synthesis with a built-in speaker
pub async fn inference_instruct(
    State(state): State<Arc<AppState>>,
    form: SynthesisForm,
) -> AppResult<Response> {
    let text = form.text("tts_text")?;
    let speaker_id = form.text("spk_id")?;
    let instruct_text = form.text("instruct_text")?;

    let job = SynthesisJob::new(
        text,
        Conditioning::Instruct {
            instruct_text,
            target: InstructTarget::Speaker(speaker_id),
        },
    );
    stream_response(&state, job).await
}

/// Instruction-guided synthesis with the voice in `prompt_wav`
pub async fn inference_instruct2(
    State(state): State<Arc<AppState>>,
    form: SynthesisForm,
) -> AppResult<Response> {
    let text = form.text("tts_text")?;
    let instruct_text = form.text("instruct_text")?;
    let prompt = form.prompt_speech("prompt_wav")?;

    let job = SynthesisJob::new(
        text,
        Conditioning::Instruct {
            instruct_text,
            target: InstructTarget::Prompt(prompt),
        },
    );
    stream_response(&state, job).await
}
