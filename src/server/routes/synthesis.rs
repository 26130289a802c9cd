//! Single Utterance Synthesis Routes

use axum::extract::{Multipart, State};
use axum::response::Response;
use axum::Json;
use std::sync::Arc;
use tracing::info;

use crate::core::error::{ResourceKind, Result, TtsError};
use crate::engine::GenerationMode;
use crate::server::form::FormData;
use crate::server::routes::{check_text, model_field, reference_field, render, wav_response};
use crate::server::server_core::ServerState;
use crate::server::types::{DesignRequest, DEFAULT_LANGUAGE, DEFAULT_VOICE_INSTRUCT};
use crate::text::resolve_language;
use crate::voice::{resolve_voice, RequestPath, DEFAULT_VOICE};

/// `POST /design`: voice described in natural language
pub async fn design(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DesignRequest>,
) -> Result<Response> {
    check_text(&state, "text", &request.text)?;
    let language = resolve_language(&request.language, &request.text)?;
    let instruct = match request.voice_instruct.trim() {
        "" => DEFAULT_VOICE_INSTRUCT,
        instruct => instruct,
    };

    let wav = render(&state, &request.text, language, GenerationMode::Design { instruct }).await?;
    Ok(wav_response(wav, "voice_design.wav"))
}

/// `POST /clone`: clone from a cached prompt or a reference clip
pub async fn clone(State(state): State<Arc<ServerState>>, multipart: Multipart) -> Result<Response> {
    let form = FormData::from_multipart(multipart).await?;
    let text = form.required("text")?;
    check_text(&state, "text", text)?;
    let language = resolve_language(form.text_or("language", DEFAULT_LANGUAGE), text)?;
    let variant = model_field(&form)?;

    if let Some(prompt_id) = form.non_blank("prompt_id") {
        let prompt_id = prompt_id.trim();
        let entry = state.prompts.get(prompt_id).ok_or_else(|| TtsError::NotFound {
            kind: ResourceKind::Prompt,
            name: prompt_id.to_string(),
            available: Vec::new(),
        })?;
        if entry.model_variant != variant {
            return Err(TtsError::CapabilityMismatch {
                message: format!(
                    "prompt '{}' was created with model {} but model {} was requested",
                    prompt_id, entry.model_variant, variant
                ),
            });
        }

        let mode = GenerationMode::ClonePrompt {
            variant,
            prompt: entry.payload,
        };
        let wav = render(&state, text, language, mode).await?;
        return Ok(wav_response(wav, "voice_clone.wav"));
    }

    let reference = reference_field(&state, &form)?.ok_or_else(|| {
        TtsError::validation("reference_audio", "reference_audio is required without prompt_id")
    })?;
    let reference_text = form.non_blank("reference_text").ok_or_else(|| {
        TtsError::validation("reference_text", "reference_text is required without prompt_id")
    })?;

    info!(
        "Cloning from a {:.1}s reference on model {}",
        reference.duration_secs(),
        variant
    );
    let mode = GenerationMode::CloneReference {
        variant,
        reference: &reference,
        reference_text,
    };
    let wav = render(&state, text, language, mode).await?;
    Ok(wav_response(wav, "voice_clone.wav"))
}

/// `POST /preset`: native or custom voice by name
pub async fn preset(State(state): State<Arc<ServerState>>, multipart: Multipart) -> Result<Response> {
    let form = FormData::from_multipart(multipart).await?;
    let text = form.required("text")?;
    check_text(&state, "text", text)?;
    let voice = form.text_or("voice", DEFAULT_VOICE).trim();
    let language = resolve_language(form.text_or("language", DEFAULT_LANGUAGE), text)?;

    let plan = resolve_voice(voice, RequestPath::Plain, &state.voices)?;
    let wav = render(&state, text, language, plan.mode()).await?;
    Ok(wav_response(wav, &format!("preset_{}.wav", voice.to_lowercase())))
}

/// `POST /preset/instruct`: native voice with a style instruction
pub async fn preset_instruct(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> Result<Response> {
    let form = FormData::from_multipart(multipart).await?;
    let text = form.required("text")?;
    check_text(&state, "text", text)?;
    // An empty instruction still runs on the instruct checkpoint
    let instruct = form.text_or("instruct", "").trim();
    let voice = form.text_or("voice", DEFAULT_VOICE).trim();
    let language = resolve_language(form.text_or("language", DEFAULT_LANGUAGE), text)?;

    let plan = resolve_voice(voice, RequestPath::Instruct(instruct), &state.voices)?;
    let wav = render(&state, text, language, plan.mode()).await?;
    Ok(wav_response(wav, &format!("preset_instruct_{}.wav", voice.to_lowercase())))
}
