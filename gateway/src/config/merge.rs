use std::path::PathBuf;

use super::ServerConfig;
use super::env::load_from_env;
use super::yaml::YamlConfig;

/// Merge environment configuration (base) with optional YAML overrides
pub fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = load_from_env()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(buffer) = server.stream_buffer_chunks {
            config.stream_buffer_chunks = buffer;
        }
        if let Some(stall) = server.stream_stall_timeout_ms {
            config.stream_stall_timeout_ms = stall;
        }
    }

    if let Some(engine) = yaml.engine {
        if let Some(model_dir) = engine.model_dir {
            config.model_dir = model_dir;
        }
        if let Some(url) = engine.url {
            config.engine_url = url;
        }
        if let Some(timeout) = engine.timeout_seconds {
            config.engine_timeout_seconds = timeout;
        }
    }

    if let Some(voices) = yaml.voices {
        if let Some(local) = voices.local_config {
            config.voices_local_config = PathBuf::from(local);
        }
        if let Some(example) = voices.example_config {
            config.voices_example_config = PathBuf::from(example);
        }
        if let Some(samples) = voices.samples_dir {
            config.audio_samples_dir = PathBuf::from(samples);
        }
    }

    if let Some(security) = yaml.security {
        if security.cors_allowed_origins.is_some() {
            config.cors_allowed_origins = security.cors_allowed_origins;
        }
    }

    Ok(config)
}
