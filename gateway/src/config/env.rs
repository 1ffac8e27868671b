use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::ServerConfig;

/// Read an optional environment variable, treating empty values as unset
fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional environment variable into `T`
fn parse_env<T>(key: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {key} '{raw}': {e}").into()),
        None => Ok(None),
    }
}

/// Build a configuration from environment variables, falling back to defaults
pub fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let defaults = ServerConfig::default();

    Ok(ServerConfig {
        host: env_var("HOST").unwrap_or(defaults.host),
        port: parse_env("PORT")?.unwrap_or(defaults.port),
        stream_buffer_chunks: parse_env("STREAM_BUFFER_CHUNKS")?
            .unwrap_or(defaults.stream_buffer_chunks),
        stream_stall_timeout_ms: parse_env("STREAM_STALL_TIMEOUT_MS")?
            .unwrap_or(defaults.stream_stall_timeout_ms),
        model_dir: env_var("MODEL_DIR").unwrap_or(defaults.model_dir),
        engine_url: env_var("ENGINE_URL").unwrap_or(defaults.engine_url),
        engine_timeout_seconds: parse_env("ENGINE_TIMEOUT_SECONDS")?
            .unwrap_or(defaults.engine_timeout_seconds),
        voices_local_config: env_var("VOICES_LOCAL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or(defaults.voices_local_config),
        voices_example_config: env_var("VOICES_EXAMPLE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or(defaults.voices_example_config),
        audio_samples_dir: env_var("AUDIO_SAMPLES_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.audio_samples_dir),
        cors_allowed_origins: env_var("CORS_ALLOWED_ORIGINS").or(defaults.cors_allowed_origins),
    })
}
