//! Remote model worker backend
//!
//! Talks JSON over HTTP to a model worker process that holds the Qwen3-TTS
//! checkpoints. Binary fields (reference audio, clone prompts, PCM output) are
//! base64 encoded; PCM is little-endian f32.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audio::ReferenceAudio;
use crate::core::error::{BackendOperation, Result, TtsError};
use crate::engine::traits::{
    GeneratedAudio, GenerationMode, GenerationRequest, ModelKind, ModelVariant, SpeechBackend,
    VoicePrompt,
};

/// HTTP client for a model worker
pub struct RemoteBackend {
    client: Client,
    base_url: String,
    loaded: RwLock<HashSet<ModelKind>>,
}

#[derive(Debug, Serialize)]
struct WorkerGenerateRequest<'a> {
    model: &'static str,
    text: &'a str,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speaker: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instruct: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_clone_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ref_audio: Option<WorkerAudio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ref_text: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WorkerPromptRequest<'a> {
    model: &'static str,
    ref_audio: WorkerAudio,
    ref_text: &'a str,
}

#[derive(Debug, Serialize)]
struct WorkerAudio {
    /// File extension hint ("wav", "mp3", ...)
    format: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct WorkerAudioResponse {
    sample_rate: u32,
    samples: String,
}

#[derive(Debug, Deserialize)]
struct WorkerPromptResponse {
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct WorkerErrorResponse {
    #[serde(alias = "detail")]
    error: String,
}

impl RemoteBackend {
    /// Create a client for the worker at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TtsError::Config {
                message: format!("Failed to create HTTP client: {}", e),
                path: None,
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            loaded: RwLock::new(HashSet::new()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn mark_loaded(&self, kind: ModelKind) {
        let mut loaded = self.loaded.write().unwrap_or_else(PoisonError::into_inner);
        if loaded.insert(kind) {
            info!("Model {} ready on worker {}", kind, self.base_url);
        }
    }

    async fn post<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
        operation: BackendOperation,
    ) -> Result<R> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| TtsError::backend(operation, e.to_string()))?;

        Self::decode(response, operation).await
    }

    async fn decode<R: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
        operation: BackendOperation,
    ) -> Result<R> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::backend(
                operation,
                format!("worker returned {}: {}", status.as_u16(), worker_message(body)),
            ));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| TtsError::backend(operation, format!("invalid worker response: {}", e)))
    }

    fn encode_reference(reference: &ReferenceAudio) -> Result<WorkerAudio> {
        let bytes = reference.read_bytes()?;
        Ok(WorkerAudio {
            format: reference.extension().to_string(),
            data: BASE64.encode(bytes),
        })
    }
}

/// The worker's error text, untouched
fn worker_message(body: String) -> String {
    serde_json::from_str::<WorkerErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}

/// Decode base64 little-endian f32 PCM
fn decode_samples(encoded: &str) -> Result<Vec<f32>> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| TtsError::backend(BackendOperation::Generation, format!("invalid PCM payload: {}", e)))?;

    if bytes.len() % 4 != 0 {
        return Err(TtsError::backend(
            BackendOperation::Generation,
            format!("PCM payload length {} is not a multiple of 4", bytes.len()),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[async_trait]
impl SpeechBackend for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedAudio> {
        let kind = request.mode.model_kind();
        let mut body = WorkerGenerateRequest {
            model: kind.checkpoint(),
            text: request.text,
            language: request.language,
            speaker: None,
            instruct: None,
            voice_clone_prompt: None,
            ref_audio: None,
            ref_text: None,
        };

        match &request.mode {
            GenerationMode::Preset { speaker } => body.speaker = Some(*speaker),
            GenerationMode::Instruct { speaker, instruct } => {
                body.speaker = Some(*speaker);
                body.instruct = Some(*instruct);
            }
            GenerationMode::Design { instruct } => body.instruct = Some(*instruct),
            GenerationMode::ClonePrompt { prompt, .. } => {
                body.voice_clone_prompt = Some(BASE64.encode(prompt.as_bytes()));
            }
            GenerationMode::CloneReference { reference, reference_text, .. } => {
                body.ref_audio = Some(Self::encode_reference(reference)?);
                body.ref_text = Some(*reference_text);
            }
        }

        debug!("Generating {} chars on {}", request.text.chars().count(), kind);
        let response: WorkerAudioResponse = self
            .post("/v1/generate", &body, BackendOperation::Generation)
            .await?;
        self.mark_loaded(kind);

        Ok(GeneratedAudio {
            samples: decode_samples(&response.samples)?,
            sample_rate: response.sample_rate,
        })
    }

    async fn create_voice_clone_prompt(
        &self,
        variant: ModelVariant,
        reference: &ReferenceAudio,
        reference_text: &str,
    ) -> Result<VoicePrompt> {
        let kind = ModelKind::CloneBase(variant);
        let body = WorkerPromptRequest {
            model: kind.checkpoint(),
            ref_audio: Self::encode_reference(reference)?,
            ref_text: reference_text,
        };

        let response: WorkerPromptResponse = self
            .post("/v1/voice-clone-prompt", &body, BackendOperation::PromptCreation)
            .await?;
        self.mark_loaded(kind);

        let data = BASE64.decode(response.prompt).map_err(|e| {
            TtsError::backend(BackendOperation::PromptCreation, format!("invalid prompt payload: {}", e))
        })?;
        Ok(VoicePrompt::new(data))
    }

    async fn preload(&self, kind: ModelKind) -> Result<()> {
        let path = format!("/v1/models/{}/load", kind.checkpoint());
        let _: serde_json::Value = self
            .post(&path, &serde_json::json!({}), BackendOperation::ModelLoading)
            .await?;
        self.mark_loaded(kind);
        Ok(())
    }

    fn loaded_models(&self) -> Vec<ModelKind> {
        let loaded = self.loaded.read().unwrap_or_else(PoisonError::into_inner);
        ModelKind::all().iter().copied().filter(|k| loaded.contains(k)).collect()
    }
}
