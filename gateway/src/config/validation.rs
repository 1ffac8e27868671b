use super::ServerConfig;

/// Validate a fully merged configuration
pub fn validate(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_port(config.port)?;
    validate_engine_url(&config.engine_url)?;
    validate_model_dir(&config.model_dir)?;

    if config.stream_buffer_chunks == 0 {
        return Err("stream_buffer_chunks must be greater than zero".into());
    }
    if config.stream_stall_timeout_ms == 0 {
        return Err("stream_stall_timeout_ms must be greater than zero".into());
    }
    if config.engine_timeout_seconds == 0 {
        return Err("engine timeout must be greater than zero seconds".into());
    }

    Ok(())
}

fn validate_port(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    if port == 0 {
        return Err("PORT must be between 1 and 65535".into());
    }
    Ok(())
}

fn validate_engine_url(engine_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = url::Url::parse(engine_url)
        .map_err(|e| format!("Invalid engine URL '{engine_url}': {e}"))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!("Invalid engine URL '{engine_url}': unsupported scheme {scheme}").into()),
    }
}

fn validate_model_dir(model_dir: &str) -> Result<(), Box<dyn std::error::Error>> {
    if model_dir.trim().is_empty() {
        return Err("model_dir must not be empty".into());
    }
    Ok(())
}
