//! Resolved synthesis jobs.
//!
//! A [`SynthesisJob`] is what a request turns into once its fields are validated
//! and any voice profile is resolved. It carries exactly one conditioning shape
//! and an optional seed.

use std::fmt;

use crate::core::audio::PromptSpeech;
use crate::core::engine::InstructTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisMode {
    Speaker,
    ZeroShot,
    CrossLingual,
    InstructSpeaker,
    InstructPrompt,
}

impl SynthesisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisMode::Speaker => "sft",
            SynthesisMode::ZeroShot => "zero_shot",
            SynthesisMode::CrossLingual => "cross_lingual",
            SynthesisMode::InstructSpeaker => "instruct",
            SynthesisMode::InstructPrompt => "instruct2",
        }
    }
}

impl fmt::Display for SynthesisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Conditioning {
    Speaker {
        speaker_id: String,
    },
    ZeroShot {
        prompt_text: String,
        prompt: PromptSpeech,
    },
    CrossLingual {
        prompt: PromptSpeech,
    },
    Instruct {
        instruct_text: String,
        target: InstructTarget,
    },
}

impl Conditioning {
    pub fn mode(&self) -> SynthesisMode {
        match self {
            Conditioning::Speaker { .. } => SynthesisMode::Speaker,
            Conditioning::ZeroShot { .. } => SynthesisMode::ZeroShot,
            Conditioning::CrossLingual { .. } => SynthesisMode::CrossLingual,
            Conditioning::Instruct {
                target: InstructTarget::Speaker(_),
                ..
            } => SynthesisMode::InstructSpeaker,
            Conditioning::Instruct {
                target: InstructTarget::Prompt(_),
                ..
            } => SynthesisMode::InstructPrompt,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisJob {
    pub text: String,
    pub conditioning: Conditioning,
    pub seed: Option<u64>,
    /// Voice profile the job was resolved from, if any. Used for logging only.
    pub voice: Option<String>,
}

impl SynthesisJob {
    pub fn new(text: impl Into<String>, conditioning: Conditioning) -> Self {
        Self {
            text: text.into(),
            conditioning,
            seed: None,
            voice: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn mode(&self) -> SynthesisMode {
        self.conditioning.mode()
    }

    pub fn context(&self) -> JobContext {
        JobContext {
            mode: self.mode(),
            voice: self.voice.clone(),
            seed: self.seed,
        }
    }
}

/// Identifying fields of a job, carried into log lines.
#[derive(Debug, Clone, PartialEq)]
pub struct JobContext {
    pub mode: SynthesisMode,
    pub voice: Option<String>,
    pub seed: Option<u64>,
}

impl JobContext {
    pub fn new(mode: SynthesisMode) -> Self {
        Self {
            mode,
            voice: None,
            seed: None,
        }
    }
}

impl fmt::Display for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mode={}", self.mode)?;
        if let Some(voice) = &self.voice {
            write!(f, " voice={voice}")?;
        }
        if let Some(seed) = self.seed {
            write!(f, " seed={seed}")?;
        }
        Ok(())
    }
}
