//! Offline backend
//!
//! Stands in for the model runtime during development and in tests. Speech is
//! replaced by a short sine tone whose length follows the text and whose pitch
//! depends on the voice; clone prompts are digests of the reference clip and
//! transcript. Everything is deterministic.

use std::collections::HashSet;
use std::f32::consts::PI;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::audio::ReferenceAudio;
use crate::core::error::Result;
use crate::engine::traits::{
    GeneratedAudio, GenerationMode, GenerationRequest, ModelKind, ModelVariant, SpeechBackend,
    VoicePrompt,
};

/// Output rate of the Qwen3-TTS codec
pub const OFFLINE_SAMPLE_RATE: u32 = 24_000;

const SECONDS_PER_CHAR: f32 = 0.06;
const MIN_SECONDS: f32 = 0.5;
const MAX_SECONDS: f32 = 30.0;

/// FNV-1a, stable across runs
fn fnv1a(chunks: &[&[u8]]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for chunk in chunks {
        for &byte in *chunk {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        // Separator so ("ab", "c") != ("a", "bc")
        hash ^= 0xff;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Deterministic tone generator
#[derive(Default)]
pub struct OfflineBackend {
    loaded: RwLock<HashSet<ModelKind>>,
}

impl OfflineBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn mark_loaded(&self, kind: ModelKind) {
        self.loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind);
    }

    fn voice_seed(mode: &GenerationMode<'_>) -> u64 {
        match mode {
            GenerationMode::Preset { speaker } => fnv1a(&[b"preset", speaker.as_bytes()]),
            GenerationMode::Instruct { speaker, instruct } => {
                fnv1a(&[b"instruct", speaker.as_bytes(), instruct.as_bytes()])
            }
            GenerationMode::Design { instruct } => fnv1a(&[b"design", instruct.as_bytes()]),
            GenerationMode::ClonePrompt { prompt, .. } => fnv1a(&[b"clone", prompt.as_bytes()]),
            GenerationMode::CloneReference { reference_text, .. } => {
                fnv1a(&[b"clone-ref", reference_text.as_bytes()])
            }
        }
    }

    fn tone(text: &str, seed: u64) -> Vec<f32> {
        let chars = text.chars().count() as f32;
        let seconds = (chars * SECONDS_PER_CHAR).clamp(MIN_SECONDS, MAX_SECONDS);
        let len = (seconds * OFFLINE_SAMPLE_RATE as f32) as usize;
        let frequency = 110.0 + (seed % 220) as f32;

        (0..len)
            .map(|i| {
                let t = i as f32 / OFFLINE_SAMPLE_RATE as f32;
                0.3 * (2.0 * PI * frequency * t).sin()
            })
            .collect()
    }
}

#[async_trait]
impl SpeechBackend for OfflineBackend {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedAudio> {
        let kind = request.mode.model_kind();
        if let GenerationMode::CloneReference { reference, .. } = &request.mode {
            // Same failure surface as the worker for unreadable clips
            reference.read_bytes()?;
        }

        let samples = Self::tone(request.text, Self::voice_seed(&request.mode));
        debug!("Offline {} produced {} samples", kind, samples.len());
        self.mark_loaded(kind);

        Ok(GeneratedAudio {
            samples,
            sample_rate: OFFLINE_SAMPLE_RATE,
        })
    }

    async fn create_voice_clone_prompt(
        &self,
        variant: ModelVariant,
        reference: &ReferenceAudio,
        reference_text: &str,
    ) -> Result<VoicePrompt> {
        let audio = reference.read_bytes()?;
        let digest = fnv1a(&[variant.as_str().as_bytes(), &audio, reference_text.as_bytes()]);
        self.mark_loaded(ModelKind::CloneBase(variant));

        let mut data = format!("offline-prompt/{}/", variant).into_bytes();
        data.extend_from_slice(&digest.to_le_bytes());
        Ok(VoicePrompt::new(data))
    }

    async fn preload(&self, kind: ModelKind) -> Result<()> {
        self.mark_loaded(kind);
        Ok(())
    }

    fn loaded_models(&self) -> Vec<ModelKind> {
        let loaded = self.loaded.read().unwrap_or_else(PoisonError::into_inner);
        ModelKind::all().iter().copied().filter(|k| loaded.contains(k)).collect()
    }

    fn device(&self) -> String {
        "cpu".to_string()
    }
}
