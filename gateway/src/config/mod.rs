//! Configuration module for the CosyVoice gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//! Command-line flags parsed in `main.rs` are applied on top of the result.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use cosyvoice_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod validation;
mod yaml;

use crate::core::engine::RuntimeEngineConfig;
use crate::core::voice_profiles::VoiceProfileStore;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 50000;
pub const DEFAULT_MODEL_DIR: &str = "iic/CosyVoice-300M";
pub const DEFAULT_ENGINE_URL: &str = "http://127.0.0.1:50001";
pub const DEFAULT_ENGINE_TIMEOUT_SECONDS: u64 = 300;
pub const DEFAULT_VOICES_LOCAL_CONFIG: &str = "config/voices.local.json";
pub const DEFAULT_VOICES_EXAMPLE_CONFIG: &str = "config/voices.example.json";
pub const DEFAULT_AUDIO_SAMPLES_DIR: &str = "config/audio_samples";
pub const DEFAULT_STREAM_BUFFER_CHUNKS: usize = 8;
pub const DEFAULT_STREAM_STALL_TIMEOUT_MS: u64 = 30_000;

/// Server configuration
///
/// Contains all configuration needed to run the gateway, including:
/// - Server settings (host, port, streaming buffer)
/// - Engine settings (model location, inference runtime URL, timeout)
/// - Voice profile locations
/// - Security settings (CORS)
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    /// Frames buffered between the engine and a streaming PCM response
    pub stream_buffer_chunks: usize,
    /// How long a streaming client may stop reading before its job is aborted
    pub stream_stall_timeout_ms: u64,

    // Engine settings
    /// Local model path or remote repository id
    pub model_dir: String,
    /// Base URL of the inference runtime hosting the model
    pub engine_url: String,
    pub engine_timeout_seconds: u64,

    // Voice profiles
    /// Personal override, preferred when present
    pub voices_local_config: PathBuf,
    /// Checked-in example used when no override exists
    pub voices_example_config: PathBuf,
    pub audio_samples_dir: PathBuf,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: "*"
    pub cors_allowed_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            stream_buffer_chunks: DEFAULT_STREAM_BUFFER_CHUNKS,
            stream_stall_timeout_ms: DEFAULT_STREAM_STALL_TIMEOUT_MS,
            model_dir: DEFAULT_MODEL_DIR.to_string(),
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            engine_timeout_seconds: DEFAULT_ENGINE_TIMEOUT_SECONDS,
            voices_local_config: PathBuf::from(DEFAULT_VOICES_LOCAL_CONFIG),
            voices_example_config: PathBuf::from(DEFAULT_VOICES_EXAMPLE_CONFIG),
            audio_samples_dir: PathBuf::from(DEFAULT_AUDIO_SAMPLES_DIR),
            cors_allowed_origins: Some("*".to_string()),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables (with defaults)
    ///
    /// Note: .env file is loaded in main.rs at application startup
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Re-run validation after CLI overrides have been applied
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate(self)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn stream_stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stream_stall_timeout_ms)
    }

    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_seconds)
    }

    pub fn runtime_engine_config(&self) -> RuntimeEngineConfig {
        RuntimeEngineConfig {
            base_url: self.engine_url.trim_end_matches('/').to_string(),
            timeout: self.engine_timeout(),
        }
    }

    pub fn voice_profile_store(&self) -> VoiceProfileStore {
        VoiceProfileStore::new(
            self.voices_local_config.clone(),
            self.voices_example_config.clone(),
            self.audio_samples_dir.clone(),
        )
    }
}
