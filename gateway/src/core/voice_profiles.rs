//! Named voice profiles.
//!
//! Profiles live in a small JSON document:
//!
//! ```json
//! {
//!   "voices": [
//!     {
//!       "id": "gentle_female",
//!       "name": "Gentle Female",
//!       "seed": 1986,
//!       "audio_file": "gentle_female.wav",
//!       "prompt_text": "希望你以后能够做的比我还好呦。"
//!     }
//!   ]
//! }
//! ```
//!
//! Two locations are tried in order (a local override, then the checked-in
//! example). The first that exists is used as-is for that call; files are never
//! merged. Nothing is cached, so edits take effect on the next request.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::audio::{AudioError, PromptSpeech, load_prompt_speech_file};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub id: String,
    pub name: String,
    /// Seed as written in the document. Read it through [`VoiceProfile::synthesis_seed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<Value>,
    /// File name under the samples directory
    pub audio_file: String,
    /// Transcript of the reference audio
    pub prompt_text: String,
    /// Keys we don't interpret, kept so `GET /voices` echoes the document faithfully
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VoiceProfile {
    /// Seed applied before synthesizing with this profile; 0 when unset.
    ///
    /// A seed that is not a non-negative integer only fails this profile.
    pub fn synthesis_seed(&self) -> AppResult<u64> {
        match &self.seed {
            None => Ok(0),
            Some(value) => value.as_u64().ok_or_else(|| {
                AppError::ConfigMalformed(format!(
                    "voice {} has seed {value}, expected a non-negative integer",
                    self.id
                ))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfigFile {
    pub voices: Vec<VoiceProfile>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VoiceConfigFile {
    /// First profile with the given id, in document order
    pub fn find(&self, voice_id: &str) -> Option<&VoiceProfile> {
        self.voices.iter().find(|voice| voice.id == voice_id)
    }
}

#[derive(Debug, Clone)]
pub struct VoiceProfileStore {
    config_paths: Vec<PathBuf>,
    samples_dir: PathBuf,
}

impl VoiceProfileStore {
    pub fn new(
        local_config: impl Into<PathBuf>,
        example_config: impl Into<PathBuf>,
        samples_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config_paths: vec![local_config.into(), example_config.into()],
            samples_dir: samples_dir.into(),
        }
    }

    pub fn samples_dir(&self) -> &Path {
        &self.samples_dir
    }

    /// The config file that would be authoritative right now
    pub fn active_config_path(&self) -> Option<&Path> {
        self.config_paths
            .iter()
            .map(PathBuf::as_path)
            .find(|path| path.exists())
    }

    pub fn load(&self) -> AppResult<VoiceConfigFile> {
        let Some(path) = self.active_config_path() else {
            let tried = self
                .config_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            warn!(tried = %tried, "No voice configuration file found");
            return Err(AppError::ConfigMissing);
        };

        debug!(path = %path.display(), "Loading voice configuration");

        let contents = std::fs::read_to_string(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Failed to read voice configuration");
            match e.kind() {
                std::io::ErrorKind::NotFound => AppError::ConfigMissing,
                _ => AppError::ConfigMalformed(e.to_string()),
            }
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Voice configuration does not parse");
            AppError::ConfigMalformed(e.to_string())
        })
    }

    pub fn resolve(&self, voice_id: &str) -> AppResult<VoiceProfile> {
        self.load()?
            .find(voice_id)
            .cloned()
            .ok_or_else(|| AppError::VoiceNotFound(voice_id.to_string()))
    }

    /// Location of a reference sample. Only bare file names are accepted.
    pub fn sample_path(&self, audio_file: &str) -> AppResult<PathBuf> {
        let mut components = Path::new(audio_file).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.samples_dir.join(name)),
            _ => {
                warn!(audio_file, "Rejecting audio sample outside the samples directory");
                Err(AppError::ConfigMalformed(format!(
                    "audio_file must be a plain file name: {audio_file}"
                )))
            }
        }
    }

    /// Load a profile's reference sample as 16 kHz mono speech.
    pub fn resolve_audio_sample(&self, audio_file: &str) -> AppResult<PromptSpeech> {
        let path = self.sample_path(audio_file)?;
        if !path.exists() {
            return Err(AppError::SampleMissing(audio_file.to_string()));
        }

        load_prompt_speech_file(&path).map_err(|e| match e {
            AudioError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                AppError::SampleMissing(audio_file.to_string())
            }
            other => AppError::ConfigMalformed(format!(
                "audio sample {audio_file} could not be decoded: {other}"
            )),
        })
    }
}
