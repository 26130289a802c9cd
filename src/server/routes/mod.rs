//! Route handlers
//!
//! Shared helpers for text checks, backend calls and audio responses live
//! here; each submodule owns one route family.

pub mod batch;
pub mod health;
pub mod mcp;
pub mod models;
pub mod prompts;
pub mod stats;
pub mod synthesis;
pub mod tokenizer;
pub mod voices;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::audio::{encode_generated, ReferenceAudio};
use crate::core::error::{Result, TtsError};
use crate::engine::{GenerationMode, GenerationRequest, ModelVariant};
use crate::server::form::FormData;
use crate::server::server_core::ServerState;
use crate::text::Language;

/// Reject empty and oversized texts
pub(crate) fn check_text(state: &ServerState, field: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(TtsError::validation(field, format!("{} is empty", field)));
    }
    let limit = state.config.limits.max_text_chars;
    let chars = text.chars().count();
    if chars > limit {
        return Err(TtsError::validation(
            field,
            format!("{} is too long: {} characters (max: {})", field, chars, limit),
        ));
    }
    Ok(())
}

/// `model` form field, `1.7B` when absent
pub(crate) fn model_field(form: &FormData) -> Result<ModelVariant> {
    match form.non_blank("model") {
        Some(value) => value.trim().parse(),
        None => Ok(ModelVariant::default()),
    }
}

/// Uploaded reference clip, duration checked against the configured bounds
pub(crate) fn reference_field(state: &ServerState, form: &FormData) -> Result<Option<ReferenceAudio>> {
    let Some(upload) = form.file("reference_audio") else {
        return Ok(None);
    };
    let reference = ReferenceAudio::from_upload(&upload.bytes, upload.filename.as_deref())?;
    let limits = &state.config.limits;
    reference.ensure_duration(limits.min_reference_secs, limits.max_reference_secs)?;
    Ok(Some(reference))
}

/// One backend generation, encoded as WAV
pub(crate) async fn render(
    state: &ServerState,
    text: &str,
    language: Language,
    mode: GenerationMode<'_>,
) -> Result<Vec<u8>> {
    let model = mode.model_kind();
    let request = GenerationRequest {
        text,
        language: language.name(),
        mode,
    };
    let audio = state.backend.generate(&request).await?;
    debug!(
        "Generated {:.2}s on {} ({})",
        audio.duration_secs(),
        model,
        language.code()
    );
    encode_generated(&audio)
}

fn attachment(bytes: Vec<u8>, content_type: &'static str, filename: &str) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(bytes),
    )
        .into_response()
}

pub(crate) fn wav_response(bytes: Vec<u8>, filename: &str) -> Response {
    attachment(bytes, "audio/wav", filename)
}

pub(crate) fn zip_response(bytes: Vec<u8>, filename: &str) -> Response {
    attachment(bytes, "application/zip", filename)
}
