//! Model backend abstraction
//!
//! The Qwen3-TTS checkpoints are served by an external model runtime. The server
//! only talks to it through [`SpeechBackend`]: it hands over text, a resolved
//! language name and a generation mode, and gets PCM samples back. Voice-clone
//! prompts travel as [`VoicePrompt`] blobs the server never looks inside.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::audio::ReferenceAudio;
use crate::core::error::{Result, TtsError};

/// Size class of a model checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVariant {
    /// 1.7B parameters (quality)
    #[serde(rename = "1.7B")]
    Large,
    /// 0.6B parameters (fast)
    #[serde(rename = "0.6B")]
    Small,
}

impl ModelVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Large => "1.7B",
            Self::Small => "0.6B",
        }
    }

    pub fn all() -> &'static [ModelVariant] {
        &[ModelVariant::Large, ModelVariant::Small]
    }
}

impl Default for ModelVariant {
    fn default() -> Self {
        Self::Large
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1.7B" => Ok(Self::Large),
            "0.6B" => Ok(Self::Small),
            other => Err(TtsError::validation(
                "model",
                format!("model must be '1.7B' or '0.6B', not '{}'", other),
            )),
        }
    }
}

/// Checkpoints the server can ask the backend to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Description-based voice design (1.7B-VoiceDesign)
    VoiceDesign,
    /// Native speakers with style instructions (1.7B-CustomVoice)
    InstructVoice,
    /// Native speakers, plain (0.6B-CustomVoice)
    PresetVoice,
    /// Base model supporting clone prompts
    CloneBase(ModelVariant),
}

impl ModelKind {
    /// Checkpoint directory name
    pub fn checkpoint(&self) -> &'static str {
        match self {
            Self::VoiceDesign => "1.7B-VoiceDesign",
            Self::InstructVoice => "1.7B-CustomVoice",
            Self::PresetVoice => "0.6B-CustomVoice",
            Self::CloneBase(ModelVariant::Large) => "1.7B-Base",
            Self::CloneBase(ModelVariant::Small) => "0.6B-Base",
        }
    }

    pub fn all() -> &'static [ModelKind] {
        &[
            ModelKind::VoiceDesign,
            ModelKind::InstructVoice,
            ModelKind::PresetVoice,
            ModelKind::CloneBase(ModelVariant::Large),
            ModelKind::CloneBase(ModelVariant::Small),
        ]
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.checkpoint())
    }
}

/// Opaque voice-clone prompt produced by the backend
#[derive(Clone, PartialEq, Eq)]
pub struct VoicePrompt {
    data: Vec<u8>,
}

impl VoicePrompt {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for VoicePrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoicePrompt({} bytes)", self.data.len())
    }
}

/// Mono PCM audio returned by a generation call
#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    /// Samples normalized to [-1, 1]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl GeneratedAudio {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Which generation call to make
#[derive(Debug, Clone)]
pub enum GenerationMode<'a> {
    /// Native speaker on the preset model
    Preset { speaker: &'a str },
    /// Native speaker with a style instruction
    Instruct { speaker: &'a str, instruct: &'a str },
    /// Voice described in natural language
    Design { instruct: &'a str },
    /// Cached clone prompt on the matching base model
    ClonePrompt {
        variant: ModelVariant,
        prompt: Arc<VoicePrompt>,
    },
    /// Reference clip processed on the fly
    CloneReference {
        variant: ModelVariant,
        reference: &'a ReferenceAudio,
        reference_text: &'a str,
    },
}

impl GenerationMode<'_> {
    /// Checkpoint serving this mode
    pub fn model_kind(&self) -> ModelKind {
        match self {
            Self::Preset { .. } => ModelKind::PresetVoice,
            Self::Instruct { .. } => ModelKind::InstructVoice,
            Self::Design { .. } => ModelKind::VoiceDesign,
            Self::ClonePrompt { variant, .. } | Self::CloneReference { variant, .. } => {
                ModelKind::CloneBase(*variant)
            }
        }
    }
}

/// A single generation call
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub text: &'a str,
    /// Full language name ("French", "English", ...)
    pub language: &'a str,
    pub mode: GenerationMode<'a>,
}

/// External model runtime
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Backend name for status output
    fn name(&self) -> &str;

    /// Synthesize one utterance
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedAudio>;

    /// Extract a reusable clone prompt from a reference clip and its transcript
    async fn create_voice_clone_prompt(
        &self,
        variant: ModelVariant,
        reference: &ReferenceAudio,
        reference_text: &str,
    ) -> Result<VoicePrompt>;

    /// Load a checkpoint ahead of the first request
    async fn preload(&self, kind: ModelKind) -> Result<()>;

    /// Checkpoints currently resident
    fn loaded_models(&self) -> Vec<ModelKind>;

    /// Device the backend runs on, if known
    fn device(&self) -> String {
        "unknown".to_string()
    }
}
