//! Voice resolution
//!
//! Maps a requested voice name onto the generation call that serves it.
//! Native names are checked first; creation-time validation keeps custom
//! names disjoint from them.

use std::sync::Arc;

use crate::core::error::{ResourceKind, Result, TtsError};
use crate::engine::{GenerationMode, ModelVariant, VoicePrompt};
use crate::voice::custom_store::{CustomVoiceStore, VoiceEmbedding, VoiceSource};
use crate::voice::presets::{native_names, native_voice};

/// Kind of route the request arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPath<'a> {
    /// Plain preset synthesis
    Plain,
    /// Synthesis with a style instruction
    Instruct(&'a str),
}

/// Resolved generation call
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationPlan {
    Preset {
        speaker: &'static str,
    },
    Instruct {
        speaker: &'static str,
        instruct: String,
    },
    /// Designed custom voice replayed from its stored description
    Design {
        voice_description: String,
    },
    /// Cloned custom voice on the base model it was created with
    Clone {
        variant: ModelVariant,
        prompt: Arc<VoicePrompt>,
    },
}

impl GenerationPlan {
    /// Borrow as a backend generation mode
    pub fn mode(&self) -> GenerationMode<'_> {
        match self {
            GenerationPlan::Preset { speaker } => GenerationMode::Preset { speaker: *speaker },
            GenerationPlan::Instruct { speaker, instruct } => GenerationMode::Instruct {
                speaker: *speaker,
                instruct: instruct.as_str(),
            },
            GenerationPlan::Design { voice_description } => GenerationMode::Design {
                instruct: voice_description.as_str(),
            },
            GenerationPlan::Clone { variant, prompt } => GenerationMode::ClonePrompt {
                variant: *variant,
                prompt: Arc::clone(prompt),
            },
        }
    }
}

/// Every known voice name, native and custom, sorted
pub fn known_voice_names(store: &CustomVoiceStore) -> Vec<String> {
    let mut names: Vec<String> = native_names().into_iter().map(String::from).collect();
    names.extend(store.names());
    names.sort();
    names
}

fn unknown_voice(name: &str, available: Vec<String>) -> TtsError {
    TtsError::NotFound {
        kind: ResourceKind::Voice,
        name: name.to_string(),
        available,
    }
}

/// Decide how `name` is synthesized on `path`
pub fn resolve_voice(
    name: &str,
    path: RequestPath<'_>,
    store: &CustomVoiceStore,
) -> Result<GenerationPlan> {
    if let Some(native) = native_voice(name) {
        return Ok(match path {
            RequestPath::Plain => GenerationPlan::Preset { speaker: native.name },
            RequestPath::Instruct(instruct) => GenerationPlan::Instruct {
                speaker: native.name,
                instruct: instruct.to_string(),
            },
        });
    }

    let Some(meta) = store.meta(name) else {
        let available = match path {
            RequestPath::Plain => known_voice_names(store),
            // Only natives are valid on the instruction path
            RequestPath::Instruct(_) => {
                let mut names: Vec<String> = native_names().into_iter().map(String::from).collect();
                names.sort();
                names
            }
        };
        return Err(unknown_voice(name, available));
    };

    if let RequestPath::Instruct(_) = path {
        return Err(TtsError::CapabilityMismatch {
            message: format!(
                "custom voice '{}' does not support style instructions; use /preset",
                name
            ),
        });
    }

    let embedding = store.get_embedding(name).ok_or_else(|| {
        TtsError::internal(format!("unable to load the embedding of voice '{}'", name))
    })?;

    match (meta.source, embedding.as_ref()) {
        (VoiceSource::Design, VoiceEmbedding::Design { voice_description, .. }) => {
            Ok(GenerationPlan::Design {
                voice_description: voice_description.clone(),
            })
        }
        (VoiceSource::Clone, VoiceEmbedding::Clone(prompt)) => Ok(GenerationPlan::Clone {
            variant: meta.model,
            prompt: Arc::clone(prompt),
        }),
        (source, _) => Err(TtsError::internal(format!(
            "voice '{}' is marked {} but its embedding does not match",
            name,
            source.as_str()
        ))),
    }
}
