use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 50000
///   stream_buffer_chunks: 8
///   stream_stall_timeout_ms: 30000
///
/// engine:
///   model_dir: "iic/CosyVoice-300M"
///   url: "http://127.0.0.1:50001"
///   timeout_seconds: 300
///
/// voices:
///   local_config: "config/voices.local.json"
///   example_config: "config/voices.example.json"
///   samples_dir: "config/audio_samples"
///
/// security:
///   cors_allowed_origins: "*"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub engine: Option<EngineYaml>,
    pub voices: Option<VoicesYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub stream_buffer_chunks: Option<usize>,
    pub stream_stall_timeout_ms: Option<u64>,
}

/// Engine configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EngineYaml {
    /// Local model path or remote repository id
    pub model_dir: Option<String>,
    pub url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Voice profile locations from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VoicesYaml {
    pub local_config: Option<String>,
    pub example_config: Option<String>,
    pub samples_dir: Option<String>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
