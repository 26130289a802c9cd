//! Shared helpers for the HTTP integration tests

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use qwen3_voice_api::audio::ReferenceAudio;
use qwen3_voice_api::core::{BackendOperation, Result, TtsError};
use qwen3_voice_api::engine::{
    GeneratedAudio, GenerationRequest, ModelKind, ModelVariant, OfflineBackend, SpeechBackend,
    VoicePrompt,
};
use qwen3_voice_api::server::{create_router, ServerConfig, ServerState};

const BOUNDARY: &str = "----qwen3-voice-api-test-boundary";

/// Mono 16 kHz 16-bit WAV of the given length
pub fn wav_clip(seconds: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let len = (seconds * 16_000.0) as usize;
        for i in 0..len {
            let t = i as f32 / 16_000.0;
            let sample = (0.2 * (2.0 * std::f32::consts::PI * 220.0 * t).sin() * i16::MAX as f32) as i16;
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Hand-built `multipart/form-data` body
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, path: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

pub fn delete(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

pub fn post_empty(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(path: &str, value: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(value.to_string()))
        .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "body is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn header(&self, name: header::HeaderName) -> &str {
        self.headers[name].to_str().unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    TestResponse { status, headers, body }
}

pub fn config_for(voices_dir: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.storage.voices_dir = voices_dir.to_path_buf();
    config.logging.access_log = false;
    config
}

pub fn app_with_backend(voices_dir: &Path, backend: Arc<dyn SpeechBackend>) -> (Router, Arc<ServerState>) {
    let state = Arc::new(ServerState::with_backend(config_for(voices_dir), backend).unwrap());
    (create_router(Arc::clone(&state)), state)
}

/// Router on the offline backend with its own custom voices directory
pub fn offline_app(voices_dir: &Path) -> (Router, Arc<ServerState>) {
    app_with_backend(voices_dir, Arc::new(OfflineBackend::new()))
}

/// Backend whose model calls always fail
pub struct FailingBackend;

#[async_trait]
impl SpeechBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _request: &GenerationRequest<'_>) -> Result<GeneratedAudio> {
        Err(TtsError::backend(BackendOperation::Generation, "CUDA out of memory"))
    }

    async fn create_voice_clone_prompt(
        &self,
        _variant: ModelVariant,
        _reference: &ReferenceAudio,
        _reference_text: &str,
    ) -> Result<VoicePrompt> {
        Err(TtsError::backend(BackendOperation::PromptCreation, "CUDA out of memory"))
    }

    async fn preload(&self, _kind: ModelKind) -> Result<()> {
        Ok(())
    }

    fn loaded_models(&self) -> Vec<ModelKind> {
        Vec::new()
    }
}
